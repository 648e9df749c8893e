// Catalogs stored in an Excel workbook.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::session::{io_common::make_default_id, *};

/// Reads the charts of a worksheet, the first one unless a name is given.
pub fn read_xlsx_charts(path: &str, worksheet_name: Option<&str>) -> SessionResult<Vec<Chart>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(sheet) => workbook
            .worksheet_range(sheet)
            .context(MissingWorksheetSnafu { path, sheet })?,
        None => workbook.worksheet_range_at(0).context(EmptyExcelSnafu {})?,
    }
    .context(OpeningExcelSnafu { path })?;
    parse_xlsx_charts(path, &wrange)
}

/// A header row, then one chart per row with the difficulty, the title and an
/// optional subtitle. Empty rows are skipped but still counted for the ids.
pub fn parse_xlsx_charts(path: &str, wrange: &Range<DataType>) -> SessionResult<Vec<Chart>> {
    let default_id = make_default_id(path);
    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyExcelSnafu {})?;
    debug!("parse_xlsx_charts: header: {:?}", header);

    let mut res: Vec<Chart> = Vec::new();
    for (idx, row) in iter.enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        if row.iter().all(|cell| *cell == DataType::Empty) {
            continue;
        }
        let difficulty_rating = read_difficulty(row.first(), lineno)?;
        let title = match read_text(row.get(1), lineno)? {
            Some(t) => t,
            None => whatever!("parse_xlsx_charts: row {}: missing title", lineno),
        };
        let subtitle = read_text(row.get(2), lineno)?;
        let chart = Chart {
            chart_id: default_id(lineno),
            difficulty_rating,
            title,
            subtitle,
        };
        debug!("parse_xlsx_charts: chart: {:?}", chart);
        res.push(chart);
    }
    Ok(res)
}

fn wrong_cell(cell: &DataType, lineno: usize) -> SessionError {
    SessionError::ExcelWrongCellType {
        lineno: lineno as u64,
        content: format!("{:?}", cell),
    }
}

fn read_difficulty(cell: Option<&DataType>, lineno: usize) -> SessionResult<u32> {
    match cell {
        Some(DataType::Int(i)) if *i >= 0 && *i <= u32::MAX as i64 => Ok(*i as u32),
        Some(DataType::Float(f)) if f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64 => {
            Ok(*f as u32)
        }
        Some(DataType::String(s)) => match s.trim().parse::<u32>() {
            Ok(x) => Ok(x),
            Err(_) => Err(wrong_cell(&DataType::String(s.clone()), lineno)),
        },
        Some(c) => Err(wrong_cell(c, lineno)),
        None => Err(wrong_cell(&DataType::Empty, lineno)),
    }
}

fn read_text(cell: Option<&DataType>, lineno: usize) -> SessionResult<Option<String>> {
    match cell {
        None | Some(DataType::Empty) => Ok(None),
        Some(DataType::String(s)) if s.trim().is_empty() => Ok(None),
        Some(DataType::String(s)) => Ok(Some(s.trim().to_string())),
        // Numeric titles happen, e.g. "1989".
        Some(DataType::Int(i)) => Ok(Some(i.to_string())),
        Some(DataType::Float(f)) => Ok(Some(f.to_string())),
        Some(c) => Err(wrong_cell(c, lineno)),
    }
}
