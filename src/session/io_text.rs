// Primitives for reading the plain text catalogs and rosters.

use crate::session::{io_common::make_default_id, *};

const SUBTITLE_DELIMITER: &str = "//";

pub fn read_text_charts(path: &str) -> SessionResult<Vec<Chart>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    parse_text_charts(path, &contents)
}

pub fn read_text_players(path: &str) -> SessionResult<Vec<Player>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    Ok(parse_text_players(path, &contents))
}

/// One chart per line: `<difficulty> <title>[ // <subtitle>]`. Blank lines are
/// skipped but still counted for the ids.
pub fn parse_text_charts(path: &str, contents: &str) -> SessionResult<Vec<Chart>> {
    let default_id = make_default_id(path);
    let mut res: Vec<Chart> = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let lineno = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let bad_line = || TextLineParseSnafu {
            path,
            lineno,
            line: line.to_string(),
        };
        let (rating, rest) = trimmed.split_once(char::is_whitespace).context(bad_line())?;
        let difficulty_rating = rating.parse::<u32>().ok().context(bad_line())?;
        let (title, subtitle) = match rest.split_once(SUBTITLE_DELIMITER) {
            Some((t, s)) => (t.trim(), Some(s.trim().to_string())),
            None => (rest.trim(), None),
        };
        ensure!(!title.is_empty(), bad_line());
        let chart = Chart {
            chart_id: default_id(lineno),
            difficulty_rating,
            title: title.to_string(),
            subtitle,
        };
        debug!("parse_text_charts: lineno: {:?} chart: {:?}", lineno, chart);
        res.push(chart);
    }
    Ok(res)
}

/// One player name per line, in turn order.
pub fn parse_text_players(path: &str, contents: &str) -> Vec<Player> {
    let default_id = make_default_id(path);
    contents
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let name = line.trim();
            if name.is_empty() {
                None
            } else {
                Some(Player {
                    player_id: default_id(idx + 1),
                    name: name.to_string(),
                })
            }
        })
        .collect()
}
