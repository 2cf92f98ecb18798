//! Session metadata and the modal form that collects it before play starts.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{self, Color as CColor};
use crossterm::{cursor, queue, terminal};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMetadata {
    pub subject_id: String,
    pub simulator_run: String,
    pub comments: String,
}

impl SessionMetadata {
    pub fn new(subject_id: impl Into<String>, simulator_run: impl Into<String>, comments: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            simulator_run: simulator_run.into(),
            comments: comments.into(),
        }
    }

    /// Payload of the leading `SESSION_INFO` record.
    pub fn info_payload(&self) -> String {
        format!(
            "subject_id={};run={};comments={}",
            self.subject_id, self.simulator_run, self.comments
        )
    }
}

// ── Form state ──────────────────────────────────────────────────────────────

const LABELS: [&str; 3] = ["Subject ID", "Simulator run", "Comments"];
const LIMITS: [usize; 3] = [24, 24, 80];
const INSTRUCTIONS: &str = "TAB / ENTER to move fields. ENTER on last field to start. ESC to skip.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKey {
    Char(char),
    Backspace,
    Tab,
    Enter,
    Esc,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    Editing,
    Submitted(SessionMetadata),
    /// The player asked to leave before the game started.
    Cancelled,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataForm {
    values: [String; 3],
    current: usize,
}

impl MetadataForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn value(&self, field: usize) -> &str {
        &self.values[field]
    }

    pub fn handle(&mut self, key: FormKey) -> FormStatus {
        match key {
            FormKey::Tab => self.current = (self.current + 1) % LABELS.len(),
            FormKey::Enter if self.current + 1 < LABELS.len() => self.current += 1,
            FormKey::Enter | FormKey::Esc => return FormStatus::Submitted(self.finish()),
            FormKey::Cancel => return FormStatus::Cancelled,
            FormKey::Backspace => {
                self.values[self.current].pop();
            }
            FormKey::Char(c) if !c.is_control() => {
                let value = &mut self.values[self.current];
                if value.chars().count() < LIMITS[self.current] {
                    value.push(c);
                }
            }
            FormKey::Char(_) => {}
        }
        FormStatus::Editing
    }

    fn finish(&self) -> SessionMetadata {
        SessionMetadata::new(self.values[0].trim(), self.values[1].trim(), self.values[2].trim())
    }

    fn draw(&self, out: &mut impl Write) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        let width = 60u16.min(cols.saturating_sub(2));
        let height = 12u16;
        let left = cols.saturating_sub(width) / 2;
        let top = rows.saturating_sub(height) / 2;

        queue!(
            out,
            style::ResetColor,
            terminal::Clear(terminal::ClearType::All),
            style::SetForegroundColor(CColor::White)
        )?;
        let blank = " ".repeat(width.saturating_sub(2) as usize);
        let edge = "-".repeat(width.saturating_sub(2) as usize);
        queue!(out, cursor::MoveTo(left, top), style::Print(format!("+{edge}+")))?;
        for row in 1..height - 1 {
            queue!(out, cursor::MoveTo(left, top + row), style::Print(format!("|{blank}|")))?;
        }
        queue!(out, cursor::MoveTo(left, top + height - 1), style::Print(format!("+{edge}+")))?;

        let title = "Session Info";
        queue!(
            out,
            cursor::MoveTo(left + (width.saturating_sub(title.len() as u16)) / 2, top + 1),
            style::Print(title)
        )?;

        let inner = width.saturating_sub(4) as usize;
        let mut y = top + 3;
        for line in wrap(INSTRUCTIONS, inner) {
            queue!(
                out,
                cursor::MoveTo(left + 2, y),
                style::SetForegroundColor(CColor::Rgb { r: 200, g: 100, b: 200 }),
                style::Print(line)
            )?;
            y += 1;
        }

        y += 1;
        let value_width = inner.saturating_sub(16);
        for (i, label) in LABELS.iter().enumerate() {
            let color = if i == self.current {
                CColor::Rgb { r: 255, g: 255, b: 0 }
            } else {
                CColor::Rgb { r: 200, g: 200, b: 200 }
            };
            let value = if self.values[i].is_empty() { "_" } else { self.values[i].as_str() };
            // Long comments show their tail so the cursor stays visible.
            let shown: String = {
                let n = value.chars().count();
                value.chars().skip(n.saturating_sub(value_width)).collect()
            };
            queue!(
                out,
                cursor::MoveTo(left + 2, y),
                style::SetForegroundColor(color),
                style::Print(format!("{label}:")),
                cursor::MoveTo(left + 18, y),
                style::SetForegroundColor(CColor::White),
                style::Print(shown)
            )?;
            y += 2;
        }
        queue!(out, style::ResetColor)?;
        out.flush()
    }
}

/// Greedy word wrap on whitespace.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
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

fn form_key(code: KeyCode, modifiers: KeyModifiers) -> Option<FormKey> {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(FormKey::Cancel),
        KeyCode::Char(c) => Some(FormKey::Char(c)),
        KeyCode::Backspace => Some(FormKey::Backspace),
        KeyCode::Tab => Some(FormKey::Tab),
        KeyCode::Enter => Some(FormKey::Enter),
        KeyCode::Esc => Some(FormKey::Esc),
        _ => None,
    }
}

/// Blocks until the form is submitted. Returns `None` if the player cancelled.
///
/// Expects the terminal to already be in raw mode on the alternate screen.
pub fn collect(out: &mut impl Write) -> io::Result<Option<SessionMetadata>> {
    let mut form = MetadataForm::new();
    form.draw(out)?;
    loop {
        if !event::poll(Duration::from_millis(33))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                let Some(k) = form_key(key.code, key.modifiers) else {
                    continue;
                };
                match form.handle(k) {
                    FormStatus::Editing => {}
                    FormStatus::Submitted(meta) => return Ok(Some(meta)),
                    FormStatus::Cancelled => return Ok(None),
                }
            }
            Event::Resize(..) => {}
            _ => continue,
        }
        form.draw(out)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(form: &mut MetadataForm, s: &str) {
        for c in s.chars() {
            assert_eq!(form.handle(FormKey::Char(c)), FormStatus::Editing);
        }
    }

    #[test]
    fn enter_walks_fields_then_submits() {
        let mut form = MetadataForm::new();
        type_str(&mut form, " S01 ");
        form.handle(FormKey::Enter);
        type_str(&mut form, "R2");
        form.handle(FormKey::Enter);
        type_str(&mut form, "first try");
        let status = form.handle(FormKey::Enter);
        assert_eq!(status, FormStatus::Submitted(SessionMetadata::new("S01", "R2", "first try")));
    }

    #[test]
    fn escape_submits_with_empty_fields() {
        let mut form = MetadataForm::new();
        type_str(&mut form, "S01");
        assert_eq!(
            form.handle(FormKey::Esc),
            FormStatus::Submitted(SessionMetadata::new("S01", "", ""))
        );
    }

    #[test]
    fn tab_cycles() {
        let mut form = MetadataForm::new();
        for expected in [1, 2, 0, 1] {
            form.handle(FormKey::Tab);
            assert_eq!(form.current(), expected);
        }
    }

    #[test]
    fn length_limits_and_backspace() {
        let mut form = MetadataForm::new();
        type_str(&mut form, &"x".repeat(30));
        assert_eq!(form.value(0).len(), 24);
        form.handle(FormKey::Backspace);
        assert_eq!(form.value(0).len(), 23);

        form.handle(FormKey::Tab);
        form.handle(FormKey::Tab);
        type_str(&mut form, &"y".repeat(100));
        assert_eq!(form.value(2).len(), 80);
    }

    #[test]
    fn control_chars_are_dropped() {
        let mut form = MetadataForm::new();
        form.handle(FormKey::Char('\u{7}'));
        assert_eq!(form.value(0), "");
    }

    #[test]
    fn cancel() {
        let mut form = MetadataForm::new();
        assert_eq!(form.handle(FormKey::Cancel), FormStatus::Cancelled);
    }

    #[test]
    fn wraps_instructions() {
        let lines = wrap(INSTRUCTIONS, 30);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= 30));
        assert_eq!(lines.join(" "), INSTRUCTIONS);
    }

    #[test]
    fn info_payload() {
        let meta = SessionMetadata::new("S01", "R2", "ok");
        assert_eq!(meta.info_payload(), "subject_id=S01;run=R2;comments=ok");
    }
}
