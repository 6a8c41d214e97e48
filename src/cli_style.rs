//! Terminal styling for the shell: palette, framed sections, tables and the
//! notification card.

use crate::delivery::Notification;
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Color as CtColor, Stylize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

// ── clap ────────────────────────────────────────────────────────────────────

fn ansi(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(Color::Ansi(color)))
}

pub fn get_styles() -> Styles {
    let heading = ansi(AnsiColor::Yellow).bold().underline();
    let failure = ansi(AnsiColor::Red).bold();
    Styles::styled()
        .usage(heading)
        .header(heading)
        .literal(ansi(AnsiColor::Green).bold())
        .invalid(failure)
        .error(failure)
        .placeholder(ansi(AnsiColor::BrightBlack))
}

// ── palette: Arequipa at dusk ───────────────────────────────────────────────

pub mod colors {
    use crossterm::style::Color;

    const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::Rgb { r, g, b }
    }

    /// White volcanic stone the old town is built from.
    pub const SILLAR: Color = rgb(245, 240, 225);
    pub const SUN: Color = rgb(255, 196, 0);
    pub const TERRACOTTA: Color = rgb(226, 114, 91);
    pub const SKY: Color = rgb(110, 170, 240);
    pub const GREEN: Color = rgb(0, 220, 130);
    pub const ORANGE: Color = rgb(255, 150, 40);
    pub const RED: Color = rgb(255, 85, 85);
    pub const DIM: Color = rgb(128, 128, 128);
}

pub mod box_chars {
    pub const HORIZONTAL: &str = "─";
    pub const VERTICAL: &str = "│";

    pub const TOP_LEFT: &str = "╭";
    pub const TOP_RIGHT: &str = "╮";
    pub const BOTTOM_LEFT: &str = "╰";
    pub const BOTTOM_RIGHT: &str = "╯";

    pub const TEE_LEFT: &str = "├";
    pub const TEE_RIGHT: &str = "┤";
    pub const TEE_DOWN: &str = "┬";
    pub const TEE_UP: &str = "┴";
    pub const JUNCTION: &str = "┼";

    pub const BULLET: &str = "●";
    pub const BULLET_EMPTY: &str = "○";
    pub const DIAMOND: &str = "◆";
    pub const CHECK: &str = "✓";
    pub const CROSS_MARK: &str = "✗";
    pub const BELL: &str = "🔔";
}

/// Horizontal rule `left───…───right` spanning `width` columns between the ends.
fn print_rule(left: &str, right: &str, width: usize, color: CtColor) {
    let line = format!("{left}{}{right}", box_chars::HORIZONTAL.repeat(width));
    println!("{}", line.with(color));
}

// ── banner ──────────────────────────────────────────────────────────────────

const BANNER: &str = r#"
     ██████╗ ██╗   ██╗██╗██████╗ ███████╗
    ██╔════╝ ██║   ██║██║██╔══██╗██╔════╝
    ██║  ███╗██║   ██║██║██║  ██║█████╗
    ██║   ██║██║   ██║██║██║  ██║██╔══╝
    ╚██████╔╝╚██████╔╝██║██████╔╝███████╗
     ╚═════╝  ╚═════╝ ╚═╝╚═════╝ ╚══════╝
"#;

pub fn print_banner() {
    // Sunset gradient, top to bottom.
    let gradient = [
        colors::SUN,
        colors::SUN,
        colors::ORANGE,
        colors::ORANGE,
        colors::TERRACOTTA,
        colors::TERRACOTTA,
        colors::SKY,
    ];
    for (line, color) in BANNER.lines().zip(gradient.iter().chain(std::iter::repeat(&colors::SUN)))
    {
        println!("{}", line.with(*color).bold());
    }
    println!(
        "{}",
        "  ─────────────  TOURIST GUIDE NOTIFIER  ─────────────".with(colors::DIM)
    );
    println!();
}

// ── one-line messages ───────────────────────────────────────────────────────

fn print_marked(mark: &str, color: CtColor, message: &str) {
    println!(" {} {}", mark.with(color).bold(), message.with(color));
}

pub fn print_success(message: &str) {
    print_marked(box_chars::CHECK, colors::GREEN, message);
}

pub fn print_error(message: &str) {
    print_marked(box_chars::CROSS_MARK, colors::RED, message);
}

pub fn print_warning(message: &str) {
    print_marked("⚠", colors::ORANGE, message);
}

pub fn print_info(message: &str) {
    print_marked("ℹ", colors::SKY, message);
}

// ── sections ────────────────────────────────────────────────────────────────

const SECTION_WIDTH: usize = 60;

pub fn print_section_header(title: &str) {
    let fill = SECTION_WIDTH.saturating_sub(title.width() + 2);
    let left = fill / 2;
    let bar = |n: usize| box_chars::HORIZONTAL.repeat(n).with(colors::SUN);

    println!();
    println!(
        "{}{} {} {}{}",
        box_chars::TOP_LEFT.with(colors::SUN),
        bar(left),
        title.with(colors::SUN).bold().attribute(Attribute::Italic),
        bar(fill - left),
        box_chars::TOP_RIGHT.with(colors::SUN),
    );
}

pub fn print_section_footer() {
    print_rule(
        box_chars::BOTTOM_LEFT,
        box_chars::BOTTOM_RIGHT,
        SECTION_WIDTH,
        colors::SUN,
    );
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::BULLET.with(colors::TERRACOTTA),
        format!("{key}:").with(colors::DIM),
        value.with(colors::SILLAR)
    );
}

pub fn print_key_value_highlight(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::DIAMOND.with(colors::ORANGE),
        format!("{key}:").with(colors::SUN).bold(),
        value.with(colors::GREEN).bold()
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        box_chars::BULLET_EMPTY.with(colors::DIM),
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

// ── tables ──────────────────────────────────────────────────────────────────

pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    widths: Vec<usize>,
}

impl TableBuilder {
    pub fn new(headers: Vec<&str>) -> Self {
        Self {
            widths: headers.iter().map(|h| h.width()).collect(),
            headers: headers.into_iter().map(String::from).collect(),
            rows: Vec::new(),
        }
    }

    /// Cells past the header count are ignored.
    pub fn add_row(&mut self, mut row: Vec<String>) {
        row.truncate(self.headers.len());
        for (width, cell) in self.widths.iter_mut().zip(&row) {
            *width = (*width).max(cell.width());
        }
        self.rows.push(row);
    }

    fn border(&self, left: &str, junction: &str, right: &str) -> String {
        let segments: Vec<String> = self
            .widths
            .iter()
            .map(|w| box_chars::HORIZONTAL.repeat(w + 2))
            .collect();
        format!("{left}{}{right}", segments.join(junction))
    }

    fn print_cells(&self, cells: &[String], color: CtColor, bold: bool) {
        let sep = box_chars::VERTICAL.with(colors::SUN);
        let mut line = sep.to_string();
        for (cell, width) in cells.iter().zip(&self.widths) {
            let pad = " ".repeat(width.saturating_sub(cell.width()));
            let text = if bold {
                cell.as_str().with(color).bold().to_string()
            } else {
                cell.as_str().with(color).to_string()
            };
            line.push_str(&format!(" {text}{pad} {sep}"));
        }
        println!("{line}");
    }

    pub fn print(&self) {
        let top = self.border(box_chars::TOP_LEFT, box_chars::TEE_DOWN, box_chars::TOP_RIGHT);
        let middle = self.border(box_chars::TEE_LEFT, box_chars::JUNCTION, box_chars::TEE_RIGHT);
        let bottom = self.border(box_chars::BOTTOM_LEFT, box_chars::TEE_UP, box_chars::BOTTOM_RIGHT);

        println!("{}", top.with(colors::SUN));
        self.print_cells(&self.headers, colors::SUN, true);
        println!("{}", middle.with(colors::SUN));
        for row in &self.rows {
            self.print_cells(row, colors::SILLAR, false);
        }
        println!("{}", bottom.with(colors::SUN));
    }
}

// ── notification card ───────────────────────────────────────────────────────

const CARD_WIDTH: usize = 56;

/// Render a posted notification the way a notification shade would show it.
pub fn print_notification(id: u32, notification: &Notification, replaced: bool) {
    let header = format!(
        "{} {}  #{}{}",
        box_chars::BELL,
        notification.channel_id,
        id,
        if replaced { " (updated)" } else { "" }
    );

    println!();
    print_rule(
        box_chars::TOP_LEFT,
        box_chars::TOP_RIGHT,
        CARD_WIDTH,
        colors::TERRACOTTA,
    );
    print_card_line(&header, colors::DIM, false);
    print_card_line(&notification.title, colors::SUN, true);
    print_card_line(&notification.body, colors::SILLAR, false);
    print_card_line(&notification.subtitle, colors::DIM, false);
    print_rule(
        box_chars::BOTTOM_LEFT,
        box_chars::BOTTOM_RIGHT,
        CARD_WIDTH,
        colors::TERRACOTTA,
    );
}

fn print_card_line(text: &str, color: CtColor, bold: bool) {
    let text = truncate_to_width(text, CARD_WIDTH - 2);
    let pad = " ".repeat(CARD_WIDTH.saturating_sub(text.width() + 2));
    let edge = box_chars::VERTICAL.with(colors::TERRACOTTA);
    let styled = if bold {
        text.as_str().with(color).bold().to_string()
    } else {
        text.as_str().with(color).to_string()
    };
    println!("{edge} {styled}{pad} {edge}");
}

/// Cut `text` to at most `max` display columns, ending with `…` when cut.
pub fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

// ── shell screens ───────────────────────────────────────────────────────────

pub fn get_prompt() -> String {
    let chevron = "❯";
    format!(
        "{}{}{} ",
        chevron.with(colors::SUN).bold(),
        chevron.with(colors::ORANGE).bold(),
        chevron.with(colors::TERRACOTTA).bold(),
    )
}

pub fn print_welcome(lines: &[(&str, String)]) {
    print_banner();
    print_section_header("Session");
    for (key, value) in lines {
        print_key_value(key, value);
    }
    println!();
    println!("  {}", "Type 'help' for available commands".with(colors::DIM));
    print_section_footer();
}

pub struct CommandHelp {
    pub name: &'static str,
    pub args: &'static str,
    pub description: &'static str,
}

const HELP_GROUPS: [(&str, &[&str], CtColor); 3] = [
    ("Jobs", &["now", "start", "stop", "jobs"], colors::SUN),
    (
        "Notifications",
        &["permission", "allow", "deny", "shade"],
        colors::TERRACOTTA,
    ),
    ("System", &["status", "help", "exit"], colors::ORANGE),
];

pub fn print_help(commands: &[CommandHelp]) {
    print_section_header("Available Commands");
    println!();
    for (title, names, color) in HELP_GROUPS {
        println!("  {} {}", box_chars::DIAMOND.with(color), title.with(color).bold());
        for cmd in commands.iter().filter(|c| names.contains(&c.name)) {
            println!(
                "      {} {}  {}",
                cmd.name.with(colors::GREEN).bold(),
                cmd.args.with(colors::DIM),
                cmd.description.with(colors::SILLAR)
            );
        }
        println!();
    }
    print_section_footer();
}

pub fn print_goodbye() {
    println!();
    println!(
        "  {} {}",
        "👋".with(colors::SUN),
        "¡Hasta luego! Enjoy Arequipa".with(colors::TERRACOTTA).bold()
    );
    println!();
}
