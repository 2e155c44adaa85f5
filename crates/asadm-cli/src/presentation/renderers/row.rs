//! Row-style sheet rendering: each field is a line and each record a column.

use crate::presentation::sheet::{Align, PreparedField, PreparedLeaf, PreparedSheet, Style};
use owo_colors::OwoColorize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub columns: usize,
    pub lines: usize,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self {
            columns: 80,
            lines: 24,
        }
    }
}

impl TerminalSize {
    pub fn detect() -> Self {
        match terminal_size::terminal_size() {
            Some((terminal_size::Width(w), terminal_size::Height(h))) => Self {
                columns: w as usize,
                lines: h as usize,
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub color: bool,
    pub title_repeat: bool,
    pub terminal: TerminalSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Row style lays out exactly one group.
    Groups(usize),
    /// Row style has no layout for tuple fields.
    TupleField(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Groups(n) => write!(f, "row style renders a single group, got {}", n),
            RenderError::TupleField(key) => {
                write!(f, "row style does not support tuple field {}", key)
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// Render `sheet` as text with a trailing newline, or `None` when no field
/// is visible.
pub fn render(sheet: &PreparedSheet<'_>, options: &RenderOptions) -> Result<Option<String>, RenderError> {
    let mut rfields: Vec<&PreparedLeaf<'_>> = Vec::new();
    for field in sheet.visible_fields() {
        match field {
            PreparedField::Leaf(leaf) => rfields.push(leaf),
            PreparedField::Tuple { key, .. } => return Err(RenderError::TupleField(key.to_string())),
        }
    }

    if rfields.is_empty() {
        return Ok(None);
    }

    if sheet.n_groups() != 1 {
        return Err(RenderError::Groups(sheet.n_groups()));
    }

    let separator = &sheet.decl.separator;
    let sep_width = separator.chars().count();
    let n_records = sheet.n_records();

    let row_title_width = rfields.iter().map(|f| width(f.title())).max().unwrap_or(0);
    let row_aggr_width = rfields
        .iter()
        .map(|f| aggregate_width(f) + 1)
        .max()
        .unwrap_or(0);
    let column_widths: Vec<usize> = (0..n_records)
        .map(|i| rfields.iter().map(|f| width(&f.converted[0][i])).max().unwrap_or(0))
        .collect();
    let has_aggregate = rfields.iter().any(|f| f.has_aggregate());

    let mut title_columns = BTreeSet::from([0]);
    let mut aggregate_title = false;
    let title_incr = row_title_width + sep_width;

    let total_row_title_width = if options.title_repeat {
        let terminal_width = options.terminal.columns;
        let mut cur_pos = title_incr;
        let mut n_repeats = 1;
        let mut need_column = true;

        for (i, column_width) in column_widths.iter().enumerate() {
            if need_column || cur_pos + column_width < terminal_width {
                cur_pos += column_width;
                need_column = false;
            } else {
                title_columns.insert(i);
                cur_pos = title_incr + column_width;
                n_repeats += 1;
            }
        }

        if has_aggregate && cur_pos + row_aggr_width >= terminal_width {
            aggregate_title = true;
            n_repeats += 1;
        }

        n_repeats * title_incr
    } else {
        title_incr
    };

    let title_width = total_row_title_width
        + column_widths.iter().sum::<usize>()
        + n_records.saturating_sub(1) * sep_width
        + row_aggr_width;

    let mut render = Vec::new();
    render.push(title_line(&sheet.title, title_width, options.color));
    if let Some(description) = &sheet.description {
        render.extend(wrap(description, title_width.saturating_sub(10).max(20)));
    }

    if options.title_repeat {
        rfields = repeat_title_fields(rfields, &sheet.decl.title_fields, options.terminal.lines);
    }

    let joiner = if options.color {
        separator.bold().to_string()
    } else {
        separator.clone()
    };

    for rfield in &rfields {
        let mut row = Vec::with_capacity(n_records + title_columns.len() + 1);

        for (i, column_width) in column_widths.iter().enumerate() {
            if title_columns.contains(&i) {
                row.push(title_cell(rfield, row_title_width, options.color));
            }
            row.push(entry_cell(rfield, i, *column_width, options.color));
        }

        if has_aggregate {
            if aggregate_title {
                row.push(title_cell(rfield, row_title_width, options.color));
            }
            if rfield.has_aggregate() {
                row.push(aggregate_cell(rfield, options.color));
            } else {
                row.push(String::new());
            }
        }

        render.push(row.join(&joiner));
    }

    render.push(format!("Number of rows: {}", rfields.len()));

    Ok(Some(render.join("\n") + "\n"))
}

fn width(s: &str) -> usize {
    s.chars().count()
}

fn aggregate_width(field: &PreparedLeaf<'_>) -> usize {
    if field.has_aggregate() {
        field.aggregates_converted.first().map_or(0, |s| width(s))
    } else {
        0
    }
}

/// Re-insert the title fields before every `lines - 2` other fields so they
/// stay on screen in long outputs.
fn repeat_title_fields<'s, 'a>(
    rfields: Vec<&'s PreparedLeaf<'a>>,
    title_keys: &[String],
    lines: usize,
) -> Vec<&'s PreparedLeaf<'a>> {
    let is_title = |f: &PreparedLeaf<'_>| title_keys.iter().any(|k| *k == f.decl.key);
    let titles: Vec<_> = rfields.iter().copied().filter(|f| is_title(f)).collect();
    let interval = lines.saturating_sub(2).max(1);

    let mut repeated = Vec::with_capacity(rfields.len() + titles.len());
    for (i, field) in rfields.into_iter().filter(|f| !is_title(f)).enumerate() {
        if i % interval == 0 {
            repeated.extend(titles.iter().copied());
        }
        repeated.push(field);
    }
    repeated
}

fn title_line(title: &str, width: usize, color: bool) -> String {
    let title = format!(" {} ", title);
    let pad = width.saturating_sub(self::width(&title));
    let left = pad / 2;
    let line = format!("{}{}{}", "~".repeat(left), title, "~".repeat(pad - left));
    if color { line.bold().to_string() } else { line }
}

fn wrap(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if !line.is_empty() && width(&line) + 1 + width(word) > max_width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn align(text: &str, width: usize, align: Align) -> String {
    match align {
        Align::Left => format!("{:<width$}", text),
        Align::Right => format!("{:>width$}", text),
        Align::Center => format!("{:^width$}", text),
    }
}

fn title_cell(field: &PreparedLeaf<'_>, width: usize, color: bool) -> String {
    let title = field.title();
    if !color {
        return format!("{:<width$}", title);
    }

    let pad = " ".repeat(width.saturating_sub(self::width(title)));
    let title = if field.is_ordered_by {
        title.underline().to_string()
    } else {
        title.to_string()
    };
    format!("{}{}", title, pad).bold().to_string()
}

fn entry_cell(field: &PreparedLeaf<'_>, entry_ix: usize, width: usize, color: bool) -> String {
    let cell = align(&field.converted[0][entry_ix], width, field.decl.align);
    if !color {
        return cell;
    }

    if field.groups[0][entry_ix].is_error() {
        return cell.magenta().to_string();
    }

    match field.styles[0][entry_ix] {
        Some(Style::Alert) => cell.red().bold().to_string(),
        Some(Style::Warning) => cell.yellow().to_string(),
        Some(Style::Bold) => cell.bold().to_string(),
        None => cell,
    }
}

fn aggregate_cell(field: &PreparedLeaf<'_>, color: bool) -> String {
    let cell = align(&field.aggregates_converted[0], aggregate_width(field), field.decl.align);
    if !color || field.aggregates[0].is_none() {
        return cell;
    }

    if field.is_grouped_by {
        cell.blue().bold().to_string()
    } else {
        cell.blue().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::sheet::projectors::{entry, number, row_key};
    use crate::presentation::sheet::{Aggregator, FieldDecl, SheetDecl, Sources, build};
    use asadm_types::ValueCell;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;

    fn sources(nodes: &[(&str, Value)]) -> Sources {
        let rows: BTreeMap<String, ValueCell<Value>> = nodes
            .iter()
            .map(|(node, stats)| (node.to_string(), ValueCell::Value(stats.clone())))
            .collect();
        BTreeMap::from([("svc".to_string(), rows)])
    }

    fn decl() -> SheetDecl {
        SheetDecl::new(vec![
            FieldDecl::new("Node", row_key()).into(),
            FieldDecl::new("Objects", number("svc", &["objects"]))
                .aggregator(Aggregator::sum())
                .into(),
        ])
        .title_fields(&["Node"])
    }

    fn plain() -> RenderOptions {
        RenderOptions::default()
    }

    #[test]
    fn test_render_rows_with_aggregate() {
        let decl = decl();
        let data = sources(&[("a", json!({"objects": 3})), ("bb", json!({"objects": 10}))]);
        let sheet = build(&decl, "Objects", &data, &Value::Null);

        let out = render(&sheet, &plain()).unwrap().unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "~~~ Objects ~~~");
        assert_eq!(lines[1], "Node   |a|bb|");
        assert_eq!(lines[2], "Objects|3|10|13");
        assert_eq!(lines[3], "Number of rows: 2");
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_missing_values_use_placeholders() {
        let decl = decl();
        let data = sources(&[("a", json!({"objects": 3})), ("b", json!({"objects": "x"}))]);
        let sheet = build(&decl, "Objects", &data, &Value::Null);

        let out = render(&sheet, &plain()).unwrap().unwrap();
        assert!(out.contains("Objects|3|~~|~~"));
    }

    #[test]
    fn test_titles_repeat_when_columns_overflow() {
        let decl = decl();
        let data = sources(&[
            ("node-1", json!({"objects": 1})),
            ("node-2", json!({"objects": 2})),
            ("node-3", json!({"objects": 3})),
        ]);
        let sheet = build(&decl, "Objects", &data, &Value::Null);
        let options = RenderOptions {
            color: false,
            title_repeat: true,
            terminal: TerminalSize {
                columns: 22,
                lines: 24,
            },
        };

        let out = render(&sheet, &options).unwrap().unwrap();
        let node_line = out.lines().nth(1).unwrap();
        assert_eq!(node_line, "Node   |node-1|node-2|Node   |node-3|");
    }

    #[test]
    fn test_title_fields_repeat_between_row_blocks() {
        let decl = SheetDecl::new(vec![
            FieldDecl::new("Node", row_key()).into(),
            FieldDecl::new("A", number("svc", &["a"])).into(),
            FieldDecl::new("B", number("svc", &["b"])).into(),
            FieldDecl::new("C", number("svc", &["c"])).into(),
        ])
        .title_fields(&["Node"]);
        let data = sources(&[("n", json!({"a": 1, "b": 2, "c": 3}))]);
        let sheet = build(&decl, "Letters", &data, &Value::Null);
        let options = RenderOptions {
            color: false,
            title_repeat: true,
            terminal: TerminalSize {
                columns: 80,
                lines: 4,
            },
        };

        let out = render(&sheet, &options).unwrap().unwrap();
        let titles: Vec<&str> = out
            .lines()
            .skip(1)
            .map(|line| line.split('|').next().unwrap_or("").trim())
            .collect();
        assert_eq!(titles, vec!["Node", "A", "B", "Node", "C", "Number of rows: 5"]);
    }

    #[test]
    fn test_more_than_one_group_is_rejected() {
        let decl = SheetDecl::new(vec![
            FieldDecl::new("Node", row_key()).into(),
            FieldDecl::new("Name", entry("svc")).into(),
        ])
        .group_by(&["Name"]);
        let data = sources(&[("a", json!("x")), ("b", json!("y"))]);
        let sheet = build(&decl, "Names", &data, &Value::Null);

        assert_eq!(render(&sheet, &plain()), Err(RenderError::Groups(2)));
    }

    #[test]
    fn test_nothing_visible_renders_nothing() {
        let decl = decl();
        let sheet = build(&decl, "Objects", &Sources::new(), &Value::Null);
        assert_eq!(render(&sheet, &plain()), Ok(None));
    }
}
