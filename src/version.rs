use std::cmp::Ordering;

/// Compare two dotted version strings component-wise.
///
/// Each dot-separated segment is compared numerically, so `1.10` sorts after
/// `1.9`. Missing trailing segments count as zero (`2.0` equals `2.0.0`).
/// A leading `v`/`V` and anything after a `-` or `+` are ignored; segments
/// that are not numeric compare as zero.
pub fn compare(a: &str, b: &str) -> Ordering {
    let a = segments(a);
    let b = segments(b);

    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    Ordering::Equal
}

/// True when `remote` is strictly newer than `local`. Equal versions are not
/// an update.
pub fn is_newer(remote: &str, local: &str) -> bool {
    compare(remote, local) == Ordering::Greater
}

fn segments(version: &str) -> Vec<u64> {
    let core = version
        .trim()
        .trim_start_matches(['v', 'V'])
        .split(['-', '+'])
        .next()
        .unwrap_or("");

    core.split('.').map(|s| s.parse().unwrap_or(0)).collect()
}
