//! Offline step: the organisers' spreadsheet export → `streamers.json`.
//!
//! Columns: name, link, platform (informational), viewer hint, partner
//! (`TRUE`), partner status, confirmed (`Confirmado`), announced (`TRUE`),
//! in community channel (`TRUE`).
use once_cell::sync::Lazy;
use regex::Regex;
use std::{cmp::Ordering, collections::HashMap, path::Path};

use crate::{
    error::{bad, AppResult},
    platform::{detect_platform, extract_youtube_link, Platform},
    roster::{pending, Streamer},
};

/// Placeholder rows for substitutes, never real participants.
pub const SUBSTITUTE_MARKER: &str = "SUPLENCIA";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total:        usize,
    pub with_youtube: usize,
}

/// Lowercase, whitespace runs to `-`, then drop anything outside `[a-z0-9-]`.
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    WHITESPACE
        .replace_all(&lower, "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// `"1.500"` / `"1,500"` → 1500; leading digits only, like a lenient parseInt.
pub fn parse_viewer_hint(raw: &str) -> Option<u64> {
    let digits: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '.')
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn cell<'a>(values: &[&'a str], i: usize) -> &'a str {
    let v = values.get(i).copied().map(str::trim).unwrap_or("");
    v.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(v)
}

/// One data row; `None` for blank, nameless and substitute rows.
pub fn parse_row(line: &str) -> Option<Streamer> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let values: Vec<&str> = line.split(',').collect();

    let name = cell(&values, 0);
    if name.is_empty() || name == SUBSTITUTE_MARKER {
        return None;
    }
    let link = cell(&values, 1);

    let (mut kick_link, mut twitch_link, mut youtube_link) = (None, None, None);
    let mut platform = Platform::Kick;
    if !link.is_empty() {
        match detect_platform(link) {
            Some(Platform::Kick)   => kick_link = Some(link.to_string()),
            Some(Platform::Twitch) => {
                twitch_link = Some(link.to_string());
                platform = Platform::Twitch;
            }
            _ => {}
        }
        youtube_link = extract_youtube_link(link);
    }

    let partner_status = match cell(&values, 5) {
        "" => pending(),
        s  => s.to_string(),
    };

    Some(Streamer {
        id: slugify(name),
        display_name: name.to_string(),
        kick_link,
        twitch_link,
        youtube_link,
        platform,
        viewer_hint: parse_viewer_hint(cell(&values, 3)),
        partnered: cell(&values, 4) == "TRUE",
        partner_status,
        confirmed: cell(&values, 6) == "Confirmado",
        announced: cell(&values, 7) == "TRUE",
        in_community: cell(&values, 8) == "TRUE",
    })
}

/* ── Spanish collation, good enough for names ── */

fn primary_weight(c: char) -> u32 {
    let base = match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ç' => 'c',
        // ñ is its own letter, right after n
        'ñ' => return ('n' as u32) * 2 + 1,
        other => other,
    };
    (base as u32) * 2
}

/// Accents and case only break ties; `ñ` sorts after `n`.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let (la, lb) = (a.to_lowercase(), b.to_lowercase());
    la.chars()
        .map(primary_weight)
        .cmp(lb.chars().map(primary_weight))
        .then_with(|| la.cmp(&lb))
        .then_with(|| b.cmp(a)) // lowercase before uppercase
}

/// Whole export → roster records sorted by name. The first line is a header.
///
/// Fails when a name slugs to an empty id or to an id an earlier row already
/// took; the message names the CSV lines involved so the sheet can be fixed.
pub fn parse_csv(content: &str) -> AppResult<Vec<Streamer>> {
    let mut seen: HashMap<String, (usize, String)> = HashMap::new();
    let mut streamers = Vec::new();
    for (i, line) in content.lines().enumerate().skip(1) {
        let Some(s) = parse_row(line) else { continue };
        let lineno = i + 1;
        if s.id.is_empty() || s.id.chars().all(|c| c == '-') {
            return Err(bad(format!("line {lineno}: name `{}` gives an empty id", s.display_name)));
        }
        if let Some((first, name)) = seen.get(&s.id) {
            return Err(bad(format!(
                "line {lineno}: `{}` and line {first}: `{name}` both get id `{}`",
                s.display_name, s.id
            )));
        }
        seen.insert(s.id.clone(), (lineno, s.display_name.clone()));
        streamers.push(s);
    }
    streamers.sort_by(|a, b| compare_names(&a.display_name, &b.display_name));
    Ok(streamers)
}

pub fn summarize(streamers: &[Streamer]) -> Summary {
    Summary {
        total:        streamers.len(),
        with_youtube: streamers.iter().filter(|s| s.youtube_link.is_some()).count(),
    }
}

/// Read `input`, write pretty JSON to `output`.
pub fn convert(input: &Path, output: &Path) -> AppResult<Summary> {
    let content = std::fs::read_to_string(input)?;
    let streamers = parse_csv(&content)?;
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(output, serde_json::to_string_pretty(&streamers)?)?;
    Ok(summarize(&streamers))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Nombre,Link,Plataforma,CCV,Partner,Estado,Confirmado,Anunciado,Discord";

    #[test]
    fn ids() {
        assert_eq!(slugify("El Mune"), "el-mune");
        assert_eq!(slugify("  Don   Pepe! "), "-don-pepe-");
        assert_eq!(slugify("Señor_X 2"), "seorx-2");
    }

    #[test]
    fn viewer_hints() {
        assert_eq!(parse_viewer_hint("1.500"), Some(1500));
        assert_eq!(parse_viewer_hint(" 200 "), Some(200));
        assert_eq!(parse_viewer_hint("12abc"), Some(12));
        assert_eq!(parse_viewer_hint("abc"), None);
        assert_eq!(parse_viewer_hint(""), None);
    }

    #[test]
    fn full_row() {
        let s = parse_row("El Mune,https://kick.com/elmune,Kick,1.200,TRUE,Aprobado,Confirmado,TRUE,FALSE").unwrap();
        assert_eq!(s.id, "el-mune");
        assert_eq!(s.kick_link.as_deref(), Some("https://kick.com/elmune"));
        assert_eq!(s.platform, Platform::Kick);
        assert_eq!(s.viewer_hint, Some(1200));
        assert!(s.partnered && s.confirmed && s.announced && !s.in_community);
        assert_eq!(s.partner_status, "Aprobado");
    }

    #[test]
    fn sparse_rows() {
        let s = parse_row("Pepa,https://www.twitch.tv/pepa").unwrap();
        assert_eq!(s.platform, Platform::Twitch);
        assert_eq!(s.twitch_link.as_deref(), Some("https://www.twitch.tv/pepa"));
        assert_eq!(s.partner_status, "Pendiente");
        assert!(!s.confirmed);

        let y = parse_row("Yuyu,https://youtube.com/@yuyu").unwrap();
        assert_eq!(y.platform, Platform::Kick);
        assert_eq!(y.kick_link, None);
        assert_eq!(y.youtube_link.as_deref(), Some("https://youtube.com/@yuyu"));
    }

    #[test]
    fn skipped_rows() {
        assert!(parse_row("").is_none());
        assert!(parse_row(",https://kick.com/x").is_none());
        assert!(parse_row("SUPLENCIA,,,,,,,,").is_none());
        assert!(parse_row("\"SUPLENCIA\",https://kick.com/x").is_none());
    }

    #[test]
    fn sorted_spanish_style() {
        let csv = format!("{HEADER}\nZeta,x\nÑoño,x\nnube,x\nÁlvaro,x\nSUPLENCIA,x\n\nBeto,x\n");
        let names: Vec<_> = parse_csv(&csv).unwrap().into_iter().map(|s| s.display_name).collect();
        assert_eq!(names, ["Álvaro", "Beto", "nube", "Ñoño", "Zeta"]);
    }

    #[test]
    fn colliding_ids_name_both_lines() {
        let csv = format!("{HEADER}\nEl Mune,https://kick.com/a\nBeto,x\nel  mune,https://kick.com/b\n");
        let err = parse_csv(&csv).unwrap_err().to_string();
        assert!(err.contains("line 4: `el  mune`"), "{err}");
        assert!(err.contains("line 2: `El Mune`"), "{err}");
        assert!(err.contains("`el-mune`"), "{err}");
    }

    #[test]
    fn names_without_slug_characters_are_rejected() {
        for name in ["!!!", "ñ", "¿?"] {
            let csv = format!("{HEADER}\nBeto,x\n{name},https://kick.com/x\n");
            let err = parse_csv(&csv).unwrap_err().to_string();
            assert!(err.contains("line 3"), "{name}: {err}");
            assert!(err.contains("empty id"), "{name}: {err}");
        }
    }

    #[test]
    fn convert_refuses_to_write_a_broken_roster() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("streamers.csv");
        let output = dir.path().join("streamers.json");
        std::fs::write(&input, format!("{HEADER}\nPepa,x\nPEPA,y\n")).unwrap();

        assert!(convert(&input, &output).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn convert_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("streamers.csv");
        let output = dir.path().join("out").join("streamers.json");
        std::fs::write(
            &input,
            format!("{HEADER}\nEl Mune,https://kick.com/elmune,Kick,1200,TRUE,,Confirmado,TRUE,TRUE\nSUPLENCIA,,,,,,,,\n"),
        )
        .unwrap();

        let summary = convert(&input, &output).unwrap();
        assert_eq!(summary, Summary { total: 1, with_youtube: 0 });

        let raw = std::fs::read_to_string(&output).unwrap();
        assert!(raw.starts_with("[\n  {"));
        let roster = crate::roster::Roster::from_json(&raw).unwrap();
        assert_eq!(roster.get("el-mune").unwrap().viewer_hint, Some(1200));
    }

    #[test]
    fn bundled_sample_matches_its_csv() {
        let parsed = parse_csv(include_str!("../data/streamers.csv")).unwrap();
        let shipped: Vec<Streamer> = serde_json::from_str(include_str!("../data/streamers.json")).unwrap();
        assert_eq!(parsed, shipped);
    }
}
