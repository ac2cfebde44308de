use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;

pub fn to_absolute_url(base: &Url, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }

    if let Some(path_without_slashes) = href.strip_prefix("//") {
        return format!("{}://{}", base.scheme(), path_without_slashes);
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// 剔除正文中的各类空白字符及其实体串
///
/// 覆盖半角/全角空格、tab 及 nbsp/ensp/emsp/thinsp 的 Unicode 与实体两种形态。
pub fn remove_space(s: &str) -> String {
    let mut out: String = s
        .chars()
        .filter(|c| {
            !matches!(
                c,
                ' ' | '\t' | '\u{3000}' | '\u{00a0}' | '\u{2002}' | '\u{2003}' | '\u{2009}'
            )
        })
        .collect();

    for entity in ["&nbsp;", "&ensp;", "&emsp;", "&thinsp;"] {
        if out.contains(entity) {
            out = out.replace(entity, "");
        }
    }
    out
}

/// 将连续换行折叠为单个换行
pub fn collapse_newlines(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_newline = false;
    for c in s.chars() {
        if c == '\n' {
            if !prev_newline {
                out.push('\n');
            }
            prev_newline = true;
        } else {
            prev_newline = false;
            out.push(c);
        }
    }
    out
}

/// 推断媒体文件后缀 (含点号)
///
/// 优先取 URL 路径中的扩展名，其次按 Content-Type 反查，最后回退 .jpg。
pub fn suffix_for(url: &str, content_type: Option<&str>) -> String {
    if let Ok(parsed) = Url::parse(url) {
        let path = parsed.path();
        if let Some(ext) = Path::new(path).extension().and_then(|s| s.to_str()) {
            if !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                return format!(".{}", ext.to_ascii_lowercase());
            }
        }
    }

    if let Some(ct) = content_type {
        let essence = ct.split(';').next().unwrap_or(ct).trim();
        if let Some(exts) = mime_guess::get_mime_extensions_str(essence) {
            // 同一 MIME 的候选按字典序排列，取末位可得常用写法 (jpe/jpeg/jpg -> jpg)
            if let Some(ext) = exts.last() {
                return format!(".{}", ext);
            }
        }
    }

    ".jpg".to_string()
}

/// 覆盖写入，父目录不存在时自动创建
pub async fn write_file(path: impl AsRef<Path>, data: &[u8]) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, data).await?;
    Ok(())
}

/// 追加写入，文件或父目录不存在时自动创建
pub async fn append_file(path: impl AsRef<Path>, data: &[u8]) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}
