//! Report renderers over a parsed [`Database`].
//!
//! Three views share one row-iteration pass: the log view (one row per
//! entry), the stock summary (per-stock roll accounting plus the camera
//! currently holding it) and the tags view (one machine-friendly tag line
//! per entry). The log and stock views feed the [`Table`] layout engine;
//! markdown output is the same table with a ` | ` separator and a `:---`
//! header-separator row, and the HTML mode serializes the same cells as a
//! `<table>`.
//!
//! Rendering never mutates the dataset and cannot fail on a database that
//! parsed successfully; only I/O errors propagate.

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::db::{Database, Entry, DATE_FORMAT};
use crate::id::Id;
use crate::table::{ColExt, Table, TermText};

const DIM: &str = "\x1b[38;5;244m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Rendering configuration shared by the log and stock views.
#[derive(Debug, Clone)]
pub struct Config {
    /// Only emit the entry with this short-ID (log view only).
    pub id_filter: Option<String>,
    /// Emit ANSI color escapes.
    pub color: bool,
    /// Use plain spaces between related columns instead of the separator.
    pub pretty: bool,
    /// Emit the header row.
    pub header: bool,
    /// Emit a `:---` separator row after the header (markdown tables).
    pub header_sep: bool,
    /// Separator between column groups.
    pub separator: String,
    /// Start and end each row with the separator (markdown tables).
    pub edge_separators: bool,
    /// Target total width; 0 disables stretching.
    pub width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            id_filter: None,
            color: false,
            pretty: false,
            header: true,
            header_sep: false,
            separator: " \u{2502} ".to_string(),
            edge_separators: false,
            width: 0,
        }
    }
}

impl Config {
    /// Markdown-compatible table settings: pipe separators, header
    /// separator row, no color, no stretching.
    pub fn markdown() -> Self {
        Config {
            separator: " | ".to_string(),
            header_sep: true,
            edge_separators: true,
            ..Config::default()
        }
    }
}

/// The cells of one log view row, all pre-formatted.
struct LogRow {
    date: String,
    id: String,
    camera_id: String,
    camera_brand: String,
    camera_model: String,
    active: String,
    stock_id: String,
    manufacturer: String,
    stock_name: String,
    iso: String,
    lab_id: String,
    lab_name: String,
    lab_in: String,
    lab_out: String,
    scan: String,
    line: String,
    note: String,
}

impl LogRow {
    fn header() -> Self {
        LogRow {
            date: "Date".into(),
            id: "ID".into(),
            camera_id: "[CID]".into(),
            camera_brand: "Brand".into(),
            camera_model: "Model".into(),
            active: "Active".into(),
            stock_id: "[SID]".into(),
            manufacturer: "Manufacturer".into(),
            stock_name: "Stock".into(),
            iso: "ISO".into(),
            lab_id: "[LID]".into(),
            lab_name: "Lab Name".into(),
            lab_in: "Lab in".into(),
            lab_out: "Lab out".into(),
            scan: "Scan".into(),
            line: "Line".into(),
            note: "Note".into(),
        }
    }

    fn header_sep() -> Self {
        let hs = || ":---".to_string();
        LogRow {
            date: hs(),
            id: hs(),
            camera_id: hs(),
            camera_brand: hs(),
            camera_model: hs(),
            active: hs(),
            stock_id: hs(),
            manufacturer: hs(),
            stock_name: hs(),
            iso: hs(),
            lab_id: hs(),
            lab_name: hs(),
            lab_in: hs(),
            lab_out: hs(),
            scan: hs(),
            line: hs(),
            note: hs(),
        }
    }

    fn from_entry(db: &Database, e: &Entry, id: &str, active: bool) -> Self {
        let camera = db.camera_of(e);
        let stock = db.stock_of(e);
        let company = db.company_of(e);
        let lab = db.lab_of(e);

        let fmt_date = |d: chrono::NaiveDate| d.format(DATE_FORMAT).to_string();

        LogRow {
            date: fmt_date(e.load_date),
            id: id.to_string(),
            camera_id: camera.id.to_string(),
            camera_brand: camera.brand.clone(),
            camera_model: camera.model.clone(),
            active: if active { "loaded".into() } else { " ".into() },
            stock_id: stock.id.to_string(),
            manufacturer: company.short().to_string(),
            stock_name: stock.name.clone(),
            iso: stock.iso.to_string(),
            lab_id: lab.map_or_else(|| "[N/A]".to_string(), |l| l.id.to_string()),
            lab_name: lab.map_or_else(String::new, |l| l.name.clone()),
            lab_in: e.lab_in.map(fmt_date).unwrap_or_default(),
            lab_out: e.lab_out.map(fmt_date).unwrap_or_default(),
            scan: if e.scan != 0 {
                format!("{:04}", e.scan)
            } else {
                String::new()
            },
            line: e.line.to_string(),
            note: e.note.clone(),
        }
    }

    /// Cells in display order, for the HTML serialization.
    fn cells(&self) -> [&str; 17] {
        [
            &self.date,
            &self.id,
            &self.camera_id,
            &self.camera_brand,
            &self.camera_model,
            &self.active,
            &self.stock_id,
            &self.manufacturer,
            &self.stock_name,
            &self.iso,
            &self.lab_id,
            &self.lab_name,
            &self.lab_in,
            &self.lab_out,
            &self.scan,
            &self.line,
            &self.note,
        ]
    }
}

/// Render the log view: one aligned row per entry.
pub fn render_log<W: Write>(db: &Database, w: &mut W, cfg: &Config) -> io::Result<()> {
    let mut t = Table::new();
    if cfg.width != 0 {
        t.set_target_width(cfg.width);
    }

    if cfg.header {
        push_log_row(&mut t, cfg, &LogRow::header(), false);
    }
    if cfg.header_sep {
        push_log_row(&mut t, cfg, &LogRow::header_sep(), false);
    }

    db.each_row(cfg.id_filter.as_deref(), |e, id, active| {
        push_log_row(&mut t, cfg, &LogRow::from_entry(db, e, id, active), active);
    });

    t.write_to(w, "")
}

fn push_log_row(t: &mut Table, cfg: &Config, r: &LogRow, active: bool) {
    let sep = cfg.separator.as_str();
    let space = if cfg.pretty { " " } else { sep };
    let clr = |seq: &'static str| if cfg.color { seq } else { "" };
    let (cam_pre, cam_suf) = if active && cfg.color {
        (RED, RESET)
    } else {
        ("", "")
    };

    t.new_row();
    if cfg.edge_separators {
        t.add(TermText::new(sep.trim_start()).fixed());
    }

    t.add(TermText::new(&*r.date).fixed());
    t.add(TermText::new(sep).fixed());

    t.add(TermText::new(&*r.id).fixed());
    t.add(TermText::new(sep).fixed());

    t.add(TermText::new(&*r.camera_id).decorated(clr(DIM), clr(RESET)).fixed());
    t.add(TermText::new(space).fixed());
    t.add(TermText::new(&*r.camera_brand).decorated(cam_pre, cam_suf).fixed());
    t.add(TermText::new(space).fixed());
    t.add(TermText::new(&*r.camera_model).decorated(cam_pre, cam_suf).fixed());
    t.add(TermText::new(sep).fixed());

    // In color mode the loaded camera is flagged in red instead.
    if !cfg.color {
        t.add(TermText::new(&*r.active).fixed());
        t.add(TermText::new(sep).fixed());
    }

    t.add(TermText::new(&*r.stock_id).decorated(clr(DIM), clr(RESET)).fixed());
    t.add(TermText::new(space).fixed());
    t.add(TermText::new(&*r.manufacturer).decorated(clr(GREEN), clr(RESET)).fixed());
    t.add(TermText::new(space).fixed());
    t.add(TermText::new(&*r.stock_name).decorated(clr(GREEN), clr(RESET)).fixed());
    t.add(TermText::new(space).fixed());
    t.add(TermText::new(&*r.iso).align_right().fixed());
    t.add(TermText::new(sep).fixed());

    t.add(TermText::new(&*r.lab_id).decorated(clr(DIM), clr(RESET)).fixed());
    t.add(TermText::new(space).fixed());
    t.add(TermText::new(&*r.lab_name).fixed());
    t.add(TermText::new(space).fixed());
    t.add(TermText::new(&*r.lab_in).fixed());
    t.add(TermText::new(space).fixed());
    t.add(TermText::new(&*r.lab_out).fixed());
    t.add(TermText::new(sep).fixed());

    t.add(TermText::new(&*r.scan).fixed());
    t.add(TermText::new(sep).fixed());
    t.add(TermText::new(&*r.line).fixed());
    t.add(TermText::new(sep).fixed());

    // The note is the only flexible column; it absorbs width stretching.
    t.add(TermText::new(&*r.note));

    if cfg.edge_separators {
        t.add(TermText::new(sep.trim_end()).fixed());
    }
}

/// The cells of one stock summary row.
struct StockRow {
    avail: String,
    shot: String,
    total: String,
    stock_id: String,
    manufacturer: String,
    stock_name: String,
    iso: String,
    camera: String,
}

impl StockRow {
    fn header() -> Self {
        StockRow {
            avail: "Avail".into(),
            shot: "Shot".into(),
            total: "Total".into(),
            stock_id: "SID".into(),
            manufacturer: "Manufacturer".into(),
            stock_name: "Stock".into(),
            iso: "ISO".into(),
            camera: "Camera".into(),
        }
    }

    fn header_sep() -> Self {
        StockRow {
            avail: "---:".into(),
            shot: "---:".into(),
            total: "---:".into(),
            stock_id: ":---".into(),
            manufacturer: ":---".into(),
            stock_name: ":---".into(),
            iso: ":---".into(),
            camera: ":---".into(),
        }
    }

    fn cells(&self) -> [&str; 8] {
        [
            &self.avail,
            &self.shot,
            &self.total,
            &self.stock_id,
            &self.manufacturer,
            &self.stock_name,
            &self.iso,
            &self.camera,
        ]
    }
}

/// Per-stock accounting for the summary view, sorted by stock name.
fn stock_rows(db: &Database) -> Vec<StockRow> {
    struct Agg<'a> {
        stock: &'a crate::db::Stock,
        camera: Option<&'a crate::db::Camera>,
        used: u32,
    }

    let mut agg: BTreeMap<Id, Agg> = db
        .stocks
        .iter()
        .map(|(id, s)| {
            (
                *id,
                Agg {
                    stock: s,
                    camera: None,
                    used: 0,
                },
            )
        })
        .collect();

    // Counts always run over the full entry set, never the id filter.
    db.each_row(None, |e, _, active| {
        if let Some(a) = agg.get_mut(&e.stock) {
            a.used += 1;
            if active {
                a.camera = Some(db.camera_of(e));
            }
        }
    });

    let mut sorted: Vec<Agg> = agg.into_values().collect();
    sorted.sort_by(|a, b| a.stock.name.cmp(&b.stock.name));

    sorted
        .into_iter()
        .map(|a| StockRow {
            avail: (i64::from(a.stock.rolls) - i64::from(a.used)).to_string(),
            shot: a.used.to_string(),
            total: a.stock.rolls.to_string(),
            stock_id: a.stock.id.to_string(),
            manufacturer: db.companies[&a.stock.company].short().to_string(),
            stock_name: a.stock.name.clone(),
            iso: a.stock.iso.to_string(),
            camera: a.camera.map(|c| c.to_string()).unwrap_or_default(),
        })
        .collect()
}

/// Render the stock summary: available/shot/total rolls per stock and the
/// camera currently loaded with it.
pub fn render_stock<W: Write>(db: &Database, w: &mut W, cfg: &Config) -> io::Result<()> {
    let mut t = Table::new();
    if cfg.width != 0 {
        t.set_target_width(cfg.width);
    }

    if cfg.header {
        push_stock_row(&mut t, cfg, &StockRow::header());
    }
    if cfg.header_sep {
        push_stock_row(&mut t, cfg, &StockRow::header_sep());
    }
    for row in stock_rows(db) {
        push_stock_row(&mut t, cfg, &row);
    }

    t.write_to(w, "")
}

fn push_stock_row(t: &mut Table, cfg: &Config, r: &StockRow) {
    let sep = cfg.separator.as_str();
    let space = if cfg.pretty { " " } else { sep };

    t.new_row();
    if cfg.edge_separators {
        t.add(TermText::new(sep.trim_start()).fixed());
    }

    t.add(TermText::new(&*r.avail).align_right().fixed());
    t.add(TermText::new(sep).fixed());
    t.add(TermText::new(&*r.shot).align_right().fixed());
    t.add(TermText::new(sep).fixed());
    t.add(TermText::new(&*r.total).align_right().fixed());
    t.add(TermText::new(sep).fixed());

    t.add(TermText::new(&*r.stock_id).fixed());
    t.add(TermText::new(space).fixed());
    t.add(TermText::new(&*r.manufacturer).fixed());
    t.add(TermText::new(space).fixed());
    t.add(TermText::new(&*r.stock_name).fixed());
    t.add(TermText::new(space).fixed());
    t.add(TermText::new(&*r.iso).fixed());
    t.add(TermText::new(sep).fixed());

    t.add(TermText::new(&*r.camera).fixed());

    if cfg.edge_separators {
        t.add(TermText::new(sep.trim_end()).fixed());
    }
}

/// Render the tags view: one space-separated tag line per entry.
pub fn render_tags<W: Write>(db: &Database, w: &mut W, id_filter: Option<&str>) -> io::Result<()> {
    fn clean(s: &str) -> String {
        s.replace(' ', "_").to_lowercase()
    }

    let mut out = String::new();
    db.each_row(id_filter, |e, id, _| {
        let camera = db.camera_of(e);
        let stock = db.stock_of(e);
        let company = db.company_of(e);

        let mut tags = vec![
            format!("id:{}", id),
            format!("camera:{}-{}", clean(&camera.brand), clean(&camera.model)),
            format!("film:{}-{}", clean(&company.name), clean(&stock.name)),
            format!("iso:{}", clean(&stock.iso.to_string())),
        ];
        if let Some(lab) = db.lab_of(e) {
            tags.push(format!("lab:{}", clean(&lab.name)));
        }
        if e.scan != 0 {
            tags.push(format!("scan:{:04}", e.scan));
        }
        tags.push(format!("line:{}", e.line));

        out.push_str(&tags.join(" "));
        out.push('\n');
    });

    w.write_all(out.as_bytes())
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn write_html_table<W: Write, const N: usize>(
    w: &mut W,
    header: Option<[&str; N]>,
    rows: &[[String; N]],
) -> io::Result<()> {
    writeln!(w, "<table>")?;
    if let Some(header) = header {
        write!(w, "<tr>")?;
        for cell in header {
            write!(w, "<th>{}</th>", html_escape(cell))?;
        }
        writeln!(w, "</tr>")?;
    }
    for row in rows {
        write!(w, "<tr>")?;
        for cell in row {
            write!(w, "<td>{}</td>", html_escape(cell))?;
        }
        writeln!(w, "</tr>")?;
    }
    writeln!(w, "</table>")
}

/// Render the log view as an HTML `<table>` over the same row data.
pub fn render_log_html<W: Write>(db: &Database, w: &mut W, cfg: &Config) -> io::Result<()> {
    let mut rows: Vec<[String; 17]> = Vec::new();
    db.each_row(cfg.id_filter.as_deref(), |e, id, active| {
        rows.push(LogRow::from_entry(db, e, id, active).cells().map(String::from));
    });

    let header = LogRow::header();
    write_html_table(w, cfg.header.then(|| header.cells()), &rows)
}

/// Render the stock summary as an HTML `<table>`.
pub fn render_stock_html<W: Write>(db: &Database, w: &mut W, cfg: &Config) -> io::Result<()> {
    let rows: Vec<[String; 8]> = stock_rows(db)
        .iter()
        .map(|r| r.cells().map(String::from))
        .collect();

    let header = StockRow::header();
    write_html_table(w, cfg.header.then(|| header.cells()), &rows)
}
