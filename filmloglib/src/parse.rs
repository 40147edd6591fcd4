//! Line-oriented parser for the film roll log format.
//!
//! The format is terse and hand-editable: a declaration line (`Stock kdk`)
//! opens a record, the following lines fill its fields positionally, one
//! per line, and a blank line closes it. Entry lines start with a date and
//! carry whitespace-separated fields; the line right after an entry (if it
//! is not itself a declaration) becomes the entry's note.
//!
//! The parser is a state machine mirroring that convention: each state owns
//! exactly the one field slot the next line will fill. The first error
//! aborts the parse; there is no skip-and-continue mode.

use std::collections::HashSet;
use std::io::BufRead;

use chrono::NaiveDate;

use crate::db::{Camera, Company, Database, Entry, Iso, Lab, Stock, DATE_FORMAT};
use crate::error::{Error, ErrorKind, RecordKind};
use crate::id::Id;
use crate::Result;

const KEYWORD_COMPANY: &str = "Company";
const KEYWORD_STOCK: &str = "Stock";
const KEYWORD_CAMERA: &str = "Camera";
const KEYWORD_LAB: &str = "Lab";

/// Which stock field the next line fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StockField {
    Name,
    Company,
    Iso,
    Rolls,
}

/// Which camera field the next line fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CameraField {
    Brand,
    Model,
}

/// Parser state: what the next non-blank line means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    CompanyName(Id),
    Stock(Id, StockField),
    Camera(Id, CameraField),
    LabName(Id),
    EntryNote,
}

/// Parse a complete log from a buffered reader.
///
/// Returns the fully cross-referenced dataset, or the first error with its
/// 1-based source line. A failed parse yields no dataset: callers must not
/// render partial data.
pub fn parse<R: BufRead>(reader: R) -> Result<Database> {
    let mut p = Parser {
        db: Database::default(),
        scans: HashSet::new(),
        state: State::Idle,
    };

    let mut line_no: u32 = 0;
    for line in reader.lines() {
        line_no += 1;
        let line = line.map_err(|e| ErrorKind::Io(e).at(line_no))?;
        p.line(line.trim(), line_no)?;
    }

    Ok(p.db)
}

/// Parse a complete log from a string. Convenience wrapper around [`parse`].
pub fn parse_str(input: &str) -> Result<Database> {
    parse(input.as_bytes())
}

struct Parser {
    db: Database,
    scans: HashSet<u32>,
    state: State,
}

impl Parser {
    fn line(&mut self, t: &str, line_no: u32) -> Result<()> {
        if t.is_empty() {
            // A blank line closes whatever was being filled, complete or not.
            self.state = State::Idle;
            return Ok(());
        }
        if t.starts_with('#') {
            return Ok(());
        }

        match self.state {
            State::Idle => self.idle(t, line_no),
            State::CompanyName(id) => {
                let c = self.company_mut(id, line_no)?;
                c.name = t.to_string();
                self.state = State::Idle;
                Ok(())
            }
            State::Stock(id, field) => self.stock_field(id, field, t, line_no),
            State::Camera(id, field) => {
                let c = self.camera_mut(id, line_no)?;
                match field {
                    CameraField::Brand => {
                        c.brand = t.to_string();
                        self.state = State::Camera(id, CameraField::Model);
                    }
                    CameraField::Model => {
                        c.model = t.to_string();
                        self.state = State::Idle;
                    }
                }
                Ok(())
            }
            State::LabName(id) => {
                match self.db.labs.get_mut(&id) {
                    Some(l) => l.name = t.to_string(),
                    None => {
                        return Err(ErrorKind::UnknownReference(RecordKind::Lab, id).at(line_no))
                    }
                }
                self.state = State::Idle;
                Ok(())
            }
            State::EntryNote => {
                if is_declaration(t) {
                    // The entry has no note; this line opens something new.
                    self.state = State::Idle;
                    return self.idle(t, line_no);
                }
                if let Some(last) = self.db.entries.last_mut() {
                    last.note = t.to_string();
                }
                self.state = State::Idle;
                Ok(())
            }
        }
    }

    /// Handle a line in the idle state: an entry declaration if it starts
    /// with a date, otherwise a `<keyword> <id>` record declaration.
    fn idle(&mut self, t: &str, line_no: u32) -> Result<()> {
        let tokens: Vec<&str> = t.split_whitespace().collect();

        if let Ok(date) = NaiveDate::parse_from_str(tokens[0], DATE_FORMAT) {
            let entry = self.entry(date, &tokens, line_no)?;
            self.db.entries.push(entry);
            self.state = State::EntryNote;
            return Ok(());
        }

        if tokens.len() != 2 {
            return Err(ErrorKind::MalformedLine(t.to_string()).at(line_no));
        }

        let id = Id::new(tokens[1]).map_err(|k| k.at(line_no))?;
        match tokens[0] {
            KEYWORD_COMPANY => {
                self.declare(RecordKind::Company, id, line_no)?;
                self.db.companies.insert(id, Company { id, ..Company::default() });
                self.state = State::CompanyName(id);
            }
            KEYWORD_STOCK => {
                self.declare(RecordKind::Stock, id, line_no)?;
                self.db.stocks.insert(id, Stock { id, ..Stock::default() });
                self.state = State::Stock(id, StockField::Name);
            }
            KEYWORD_CAMERA => {
                self.declare(RecordKind::Camera, id, line_no)?;
                self.db.cameras.insert(id, Camera { id, ..Camera::default() });
                self.state = State::Camera(id, CameraField::Brand);
            }
            KEYWORD_LAB => {
                self.declare(RecordKind::Lab, id, line_no)?;
                self.db.labs.insert(id, Lab { id, ..Lab::default() });
                self.state = State::LabName(id);
            }
            other => return Err(ErrorKind::UnknownKeyword(other.to_string()).at(line_no)),
        }

        Ok(())
    }

    /// Reject a declaration reusing an id already taken for that kind.
    fn declare(&self, kind: RecordKind, id: Id, line_no: u32) -> Result<()> {
        let taken = match kind {
            RecordKind::Company => self.db.companies.contains_key(&id),
            RecordKind::Stock => self.db.stocks.contains_key(&id),
            RecordKind::Camera => self.db.cameras.contains_key(&id),
            RecordKind::Lab => self.db.labs.contains_key(&id),
        };
        if taken {
            return Err(ErrorKind::DuplicateId(kind, id).at(line_no));
        }
        Ok(())
    }

    fn company_mut(&mut self, id: Id, line_no: u32) -> Result<&mut Company> {
        self.db
            .companies
            .get_mut(&id)
            .ok_or_else(|| ErrorKind::UnknownReference(RecordKind::Company, id).at(line_no))
    }

    fn camera_mut(&mut self, id: Id, line_no: u32) -> Result<&mut Camera> {
        self.db
            .cameras
            .get_mut(&id)
            .ok_or_else(|| ErrorKind::UnknownReference(RecordKind::Camera, id).at(line_no))
    }

    /// Fill the next positional stock field: name, company reference, ISO
    /// range, then roll count.
    fn stock_field(&mut self, id: Id, field: StockField, t: &str, line_no: u32) -> Result<()> {
        match field {
            StockField::Name => {
                match self.db.stocks.get_mut(&id) {
                    Some(s) => s.name = t.to_string(),
                    None => {
                        return Err(ErrorKind::UnknownReference(RecordKind::Stock, id).at(line_no))
                    }
                }
                self.state = State::Stock(id, StockField::Company);
            }
            StockField::Company => {
                let cid = Id::new(t).map_err(|k| k.at(line_no))?;
                if !self.db.companies.contains_key(&cid) {
                    return Err(ErrorKind::UnknownReference(RecordKind::Company, cid).at(line_no));
                }
                match self.db.stocks.get_mut(&id) {
                    Some(s) => s.company = cid,
                    None => {
                        return Err(ErrorKind::UnknownReference(RecordKind::Stock, id).at(line_no))
                    }
                }
                self.state = State::Stock(id, StockField::Iso);
            }
            StockField::Iso => {
                let iso = parse_iso(t, line_no)?;
                match self.db.stocks.get_mut(&id) {
                    Some(s) => s.iso = iso,
                    None => {
                        return Err(ErrorKind::UnknownReference(RecordKind::Stock, id).at(line_no))
                    }
                }
                self.state = State::Stock(id, StockField::Rolls);
            }
            StockField::Rolls => {
                let rolls = parse_rolls(t, line_no)?;
                match self.db.stocks.get_mut(&id) {
                    Some(s) => s.rolls = rolls,
                    None => {
                        return Err(ErrorKind::UnknownReference(RecordKind::Stock, id).at(line_no))
                    }
                }
                self.state = State::Idle;
            }
        }
        Ok(())
    }

    /// Parse an entry declaration line, already tokenized.
    ///
    /// `tokens[0]` is the load date; then stock id, camera id, and the
    /// optional lab fields. An explicit no-lab marker terminates the line.
    fn entry(&mut self, date: NaiveDate, tokens: &[&str], line_no: u32) -> Result<Entry> {
        if tokens.len() < 3 {
            return Err(ErrorKind::TruncatedEntry.at(line_no));
        }

        let stock = Id::new(tokens[1]).map_err(|k| k.at(line_no))?;
        if !self.db.stocks.contains_key(&stock) {
            return Err(ErrorKind::UnknownReference(RecordKind::Stock, stock).at(line_no));
        }

        let camera = Id::new(tokens[2]).map_err(|k| k.at(line_no))?;
        if !self.db.cameras.contains_key(&camera) {
            return Err(ErrorKind::UnknownReference(RecordKind::Camera, camera).at(line_no));
        }

        let mut e = Entry {
            load_date: date,
            stock,
            camera,
            lab: Id::NONE,
            lab_in: None,
            lab_out: None,
            scan: 0,
            line: line_no,
            note: String::new(),
        };

        if tokens.len() > 3 {
            if matches!(tokens[3], "-" | "--" | "---") {
                return Ok(e);
            }

            if tokens.len() < 5 {
                return Err(ErrorKind::MissingLabInDate.at(line_no));
            }
            let lab = Id::new(tokens[3]).map_err(|k| k.at(line_no))?;
            if !self.db.labs.contains_key(&lab) {
                return Err(ErrorKind::UnknownReference(RecordKind::Lab, lab).at(line_no));
            }
            e.lab = lab;
            e.lab_in = Some(parse_date(tokens[4], line_no)?);
        }

        if tokens.len() > 5 {
            e.lab_out = Some(parse_date(tokens[5], line_no)?);
        }

        if tokens.len() > 6 {
            let scan: u32 = tokens[6]
                .parse()
                .map_err(|_| ErrorKind::MalformedNumber(tokens[6].to_string()).at(line_no))?;
            if scan != 0 {
                if !self.scans.insert(scan) {
                    return Err(ErrorKind::DuplicateScanPage(scan).at(line_no));
                }
                e.scan = scan;
            }
        }

        Ok(e)
    }
}

/// Whether a trimmed line would open a new record or entry.
fn is_declaration(t: &str) -> bool {
    let tokens: Vec<&str> = t.split_whitespace().collect();
    match tokens.first() {
        None => false,
        Some(first) => {
            NaiveDate::parse_from_str(first, DATE_FORMAT).is_ok()
                || (tokens.len() == 2
                    && matches!(
                        *first,
                        KEYWORD_COMPANY | KEYWORD_STOCK | KEYWORD_CAMERA | KEYWORD_LAB
                    ))
        }
    }
}

fn parse_date(t: &str, line_no: u32) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(t, DATE_FORMAT)
        .map_err(|_| ErrorKind::MalformedDate(t.to_string()).at(line_no))
}

/// Parse an ISO line: a single value (`400`) or a low-high range
/// (`100-400`). Low must be positive and must not exceed high.
fn parse_iso(t: &str, line_no: u32) -> Result<Iso> {
    let parts: Vec<&str> = t
        .split(|c| c == ' ' || c == '-')
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() || parts.len() > 2 {
        return Err(ErrorKind::MalformedIso(t.to_string()).at(line_no));
    }

    let mut iso = Iso::default();
    for (i, part) in parts.iter().enumerate() {
        let v: u32 = part
            .parse()
            .map_err(|_| ErrorKind::MalformedNumber(part.to_string()).at(line_no))?;
        match i {
            0 => iso.low = v,
            _ => iso.high = v,
        }
    }
    if iso.high == 0 {
        iso.high = iso.low;
    }
    if iso.low == 0 || iso.high < iso.low {
        return Err(ErrorKind::MalformedIso(t.to_string()).at(line_no));
    }

    Ok(iso)
}

/// Parse a roll count line: a single integer or a `n + n + n` sum.
fn parse_rolls(t: &str, line_no: u32) -> Result<u32> {
    let mut total: u32 = 0;
    for part in t.split(|c| c == ' ' || c == '+').filter(|p| !p.is_empty()) {
        let v: u32 = part
            .parse()
            .map_err(|_| ErrorKind::MalformedNumber(part.to_string()).at(line_no))?;
        total += v;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Film roll log

Company kdk
Kodak

Stock tx4
Tri-X 400
kdk
400
5 + 3

Stock pt2
Portra 160
kdk
100-200
2

Camera f5p
Nikon
F5

Lab cew
Carmencita

2024-03-01 tx4 f5p
First roll of the year

2024-03-09 tx4 f5p cew 2024-03-12 2024-03-19 12
2024-04-02 pt2 f5p -
";

    #[test]
    fn test_parse_sample_counts() {
        let db = parse_str(SAMPLE).unwrap();
        assert_eq!(db.companies.len(), 1);
        assert_eq!(db.stocks.len(), 2);
        assert_eq!(db.cameras.len(), 1);
        assert_eq!(db.labs.len(), 1);
        assert_eq!(db.entries.len(), 3);
    }

    #[test]
    fn test_parse_stock_fields() {
        let db = parse_str(SAMPLE).unwrap();
        let tx4 = &db.stocks[&Id::new("tx4").unwrap()];
        assert_eq!(tx4.name, "Tri-X 400");
        assert_eq!(tx4.company, Id::new("kdk").unwrap());
        assert_eq!(tx4.iso, Iso { low: 400, high: 400 });
        assert_eq!(tx4.rolls, 8);

        let pt2 = &db.stocks[&Id::new("pt2").unwrap()];
        assert_eq!(pt2.iso, Iso { low: 100, high: 200 });
        assert_eq!(pt2.rolls, 2);
    }

    #[test]
    fn test_parse_camera_and_lab_fields() {
        let db = parse_str(SAMPLE).unwrap();
        let cam = &db.cameras[&Id::new("f5p").unwrap()];
        assert_eq!(cam.brand, "Nikon");
        assert_eq!(cam.model, "F5");
        assert_eq!(db.labs[&Id::new("cew").unwrap()].name, "Carmencita");
    }

    #[test]
    fn test_parse_entry_fields() {
        let db = parse_str(SAMPLE).unwrap();

        let first = &db.entries[0];
        assert_eq!(first.note, "First roll of the year");
        assert!(first.lab.is_none());
        assert_eq!(first.scan, 0);
        assert_eq!(first.line, 25);

        let second = &db.entries[1];
        assert_eq!(second.lab, Id::new("cew").unwrap());
        assert_eq!(
            second.lab_in,
            Some(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap())
        );
        assert_eq!(
            second.lab_out,
            Some(NaiveDate::from_ymd_opt(2024, 3, 19).unwrap())
        );
        assert_eq!(second.scan, 12);

        // Explicit no-lab marker
        let third = &db.entries[2];
        assert!(third.lab.is_none());
        assert!(third.note.is_empty());
    }

    #[test]
    fn test_entry_line_follows_entry_without_blank() {
        // The line after entry 2 is itself an entry declaration, so it is
        // not swallowed as a note.
        let db = parse_str(SAMPLE).unwrap();
        assert!(db.entries[1].note.is_empty());
        assert_eq!(db.entries.len(), 3);
    }

    #[test]
    fn test_comment_does_not_disturb_state() {
        let input = "\
Company kdk
# still waiting for the name
Kodak
";
        let db = parse_str(input).unwrap();
        assert_eq!(db.companies[&Id::new("kdk").unwrap()].name, "Kodak");
    }

    #[test]
    fn test_iso_single_value() {
        assert_eq!(parse_iso("400", 1).unwrap(), Iso { low: 400, high: 400 });
    }

    #[test]
    fn test_iso_range() {
        assert_eq!(
            parse_iso("100-400", 1).unwrap(),
            Iso { low: 100, high: 400 }
        );
    }

    #[test]
    fn test_iso_inverted_range_rejected() {
        assert!(matches!(
            parse_iso("400-100", 1).unwrap_err().kind,
            ErrorKind::MalformedIso(_)
        ));
    }

    #[test]
    fn test_iso_three_tokens_rejected() {
        assert!(matches!(
            parse_iso("100 200 300", 1).unwrap_err().kind,
            ErrorKind::MalformedIso(_)
        ));
    }

    #[test]
    fn test_iso_zero_rejected() {
        assert!(matches!(
            parse_iso("0", 1).unwrap_err().kind,
            ErrorKind::MalformedIso(_)
        ));
    }

    #[test]
    fn test_rolls_sum() {
        assert_eq!(parse_rolls("5 + 3 + 2", 1).unwrap(), 10);
        assert_eq!(parse_rolls("4", 1).unwrap(), 4);
        assert!(parse_rolls("4 + x", 1).is_err());
    }

    #[test]
    fn test_duplicate_stock_id() {
        let input = "\
Company kdk
Kodak

Stock tx4
Tri-X 400
kdk
400
5

Stock tx4
";
        let err = parse_str(input).unwrap_err();
        assert_eq!(err.line, 10);
        assert!(matches!(
            err.kind,
            ErrorKind::DuplicateId(RecordKind::Stock, _)
        ));
    }

    #[test]
    fn test_unknown_camera_reference() {
        let input = "\
Company kdk
Kodak

Stock tx4
Tri-X 400
kdk
400
5

2024-03-01 tx4 nop
";
        let err = parse_str(input).unwrap_err();
        assert_eq!(err.line, 10);
        assert!(matches!(
            err.kind,
            ErrorKind::UnknownReference(RecordKind::Camera, _)
        ));
    }

    #[test]
    fn test_unknown_stock_reference() {
        let input = "2024-03-01 tx4 f5p\n";
        let err = parse_str(input).unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::UnknownReference(RecordKind::Stock, _)
        ));
    }

    #[test]
    fn test_duplicate_scan_page() {
        let input = format!(
            "{}\n2024-05-01 tx4 f5p cew 2024-05-03 2024-05-09 12\n",
            SAMPLE
        );
        let err = parse_str(&input).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DuplicateScanPage(12)));
    }

    #[test]
    fn test_scan_page_zero_repeats_freely() {
        let input = format!(
            "{}\n2024-05-01 tx4 f5p cew 2024-05-03 2024-05-09 0\n\n\
             2024-06-01 tx4 f5p cew 2024-06-03 2024-06-09 0\n",
            SAMPLE
        );
        let db = parse_str(&input).unwrap();
        assert_eq!(db.entries.len(), 5);
        assert_eq!(db.entries[3].scan, 0);
        assert_eq!(db.entries[4].scan, 0);
    }

    #[test]
    fn test_lab_requires_lab_in_date() {
        let input = format!("{}\n2024-05-01 tx4 f5p cew\n", SAMPLE);
        let err = parse_str(&input).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MissingLabInDate));
    }

    #[test]
    fn test_malformed_id_in_declaration() {
        let err = parse_str("Company kodak\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(matches!(err.kind, ErrorKind::MalformedId(_)));
    }

    #[test]
    fn test_unknown_keyword() {
        let err = parse_str("Flavor abc\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownKeyword(_)));
    }

    #[test]
    fn test_wrong_token_count() {
        let err = parse_str("Company\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedLine(_)));
    }

    #[test]
    fn test_truncated_entry() {
        let input = format!("{}\n2024-05-01 tx4\n", SAMPLE);
        let err = parse_str(&input).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::TruncatedEntry));
    }

    #[test]
    fn test_bad_lab_in_date() {
        let input = format!("{}\n2024-05-01 tx4 f5p cew 2024-13-99\n", SAMPLE);
        let err = parse_str(&input).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedDate(_)));
    }

    #[test]
    fn test_parse_from_file() {
        use std::fs::File;
        use std::io::{BufReader, Write};

        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();

        let db = parse(BufReader::new(File::open(f.path()).unwrap())).unwrap();
        assert_eq!(db.entries.len(), 3);
    }

    #[test]
    fn test_blank_line_resets_partial_record() {
        // A record left half-filled is not an error at blank-line time.
        let input = "\
Company kdk
Kodak

Camera f5p
Nikon

Company ilf
Ilford
";
        let db = parse_str(input).unwrap();
        let cam = &db.cameras[&Id::new("f5p").unwrap()];
        assert_eq!(cam.brand, "Nikon");
        assert!(cam.model.is_empty());
        assert_eq!(db.companies.len(), 2);
    }
}
