use std::path::{Path, PathBuf};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Resolves a path of a job file relative to the job's directory.
pub fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

/// Two decimals, for scores and averages.
pub fn fmt_score(x: f64) -> String {
    format!("{:.2}", x)
}

/// Bounds such as "out of 60" print without decimals when they are whole.
pub fn fmt_bound(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        fmt_score(x)
    }
}

/// Makes header names unique: a repeated name gets a `.1`, `.2`... suffix.
pub fn dedup_headers(headers: Vec<String>) -> Vec<String> {
    let mut res: Vec<String> = Vec::with_capacity(headers.len());
    for h in headers {
        let mut candidate = h.clone();
        let mut idx = 1;
        while res.contains(&candidate) {
            candidate = format!("{}.{}", h, idx);
            idx += 1;
        }
        res.push(candidate);
    }
    res
}
