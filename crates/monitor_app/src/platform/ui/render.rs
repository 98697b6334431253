use std::io::{self, Write};

use monitor_core::{format_file_size, AppViewModel, ArtifactRef, ConsoleEntry, Severity, TaskPhase};
use owo_colors::OwoColorize;

use super::commands::HELP;

/// Line-oriented renderer for the operator terminal.
///
/// Console entries are printed once each, tracked by sequence number, so a
/// cleared or evicted buffer never reprints old lines.
pub struct Renderer<W: Write> {
    out: W,
    color: bool,
    last_seq: Option<u64>,
    last_status: Option<StatusLine>,
    logs: Vec<ArtifactRef>,
    sessions: Vec<ArtifactRef>,
}

#[derive(Debug, Clone, PartialEq)]
struct StatusLine {
    phase: TaskPhase,
    percent: Option<u32>,
    item: Option<(String, String)>,
    counts: Option<(u64, u64, u64)>,
    error: Option<String>,
}

impl StatusLine {
    fn from_view(view: &AppViewModel) -> Self {
        Self {
            phase: view.phase,
            percent: view.progress_percent(),
            item: view
                .current_item
                .as_ref()
                .map(|item| (item.member_id.clone(), item.family_id.clone())),
            counts: view
                .result
                .as_ref()
                .map(|r| (r.processed_count, r.success_count, r.failure_count)),
            error: view.error_message.clone(),
        }
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            last_seq: None,
            last_status: None,
            logs: Vec::new(),
            sessions: Vec::new(),
        }
    }

    /// Prints whatever changed since the previous call.
    pub fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        self.print_new_entries(&view.console)?;

        let status = StatusLine::from_view(view);
        let first_idle = self.last_status.is_none() && status.phase == TaskPhase::Idle;
        if self.last_status.as_ref() != Some(&status) && !first_idle {
            let entered_login = status.phase == TaskPhase::LoginRequired
                && self.last_status.as_ref().map(|s| s.phase) != Some(TaskPhase::LoginRequired);
            self.print_status(&status)?;
            if entered_login {
                self.print_login_hint(view)?;
            }
        }
        self.last_status = Some(status);

        if view.logs != self.logs {
            self.logs = view.logs.clone();
            self.print_logs()?;
        }
        if view.sessions != self.sessions {
            self.sessions = view.sessions.clone();
            self.print_sessions()?;
        }
        self.out.flush()
    }

    /// Prints the status block and both listings regardless of changes.
    pub fn status(&mut self, view: &AppViewModel) -> io::Result<()> {
        let status = StatusLine::from_view(view);
        self.print_status(&status)?;
        if let Some(job_id) = &view.job_id {
            writeln!(self.out, "  job: {job_id}")?;
        }
        if let Some(started) = &view.started_at {
            writeln!(self.out, "  started: {started}")?;
        }
        if let Some(ended) = &view.ended_at {
            writeln!(self.out, "  ended: {ended}")?;
        }
        if view.request_in_flight {
            writeln!(self.out, "  waiting for the backend")?;
        }
        if view.phase == TaskPhase::LoginRequired {
            self.print_login_hint(view)?;
        }
        self.last_status = Some(status);
        self.logs = view.logs.clone();
        self.sessions = view.sessions.clone();
        self.print_logs()?;
        self.print_sessions()?;
        self.out.flush()
    }

    pub fn help(&mut self) -> io::Result<()> {
        writeln!(self.out, "{HELP}")?;
        self.out.flush()
    }

    pub fn invalid(&mut self, reason: &str) -> io::Result<()> {
        let text = format!("? {reason} (type `help` for commands)");
        let line = self.paint(Severity::Warning, &text);
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }

    fn print_new_entries(&mut self, entries: &[ConsoleEntry]) -> io::Result<()> {
        for entry in entries {
            if self.last_seq.is_some_and(|seq| entry.seq <= seq) {
                continue;
            }
            let message = self.paint(entry.severity, &entry.message);
            writeln!(self.out, "[{}] {}", entry.timestamp, message)?;
            self.last_seq = Some(entry.seq);
        }
        Ok(())
    }

    fn print_status(&mut self, status: &StatusLine) -> io::Result<()> {
        let mut line = format!("== {}", status.phase.label());
        if let Some(percent) = status.percent {
            line.push_str(&format!(" {percent}%"));
        }
        if let Some((member, family)) = &status.item {
            line.push_str(&format!(" | member {member} family {family}"));
        }
        if let Some((processed, success, failed)) = status.counts {
            line.push_str(&format!(
                " | processed {processed}, success {success}, failed {failed}"
            ));
        }
        if let Some(error) = &status.error {
            line.push_str(&format!(" | error: {error}"));
        }
        let severity = match status.phase {
            TaskPhase::Completed => Severity::Success,
            TaskPhase::Failed => Severity::Error,
            TaskPhase::LoginRequired => Severity::Warning,
            _ => Severity::Info,
        };
        let line = self.paint(severity, &line);
        writeln!(self.out, "{line}")
    }

    fn print_login_hint(&mut self, view: &AppViewModel) -> io::Result<()> {
        if let Some(request) = &view.login_request {
            writeln!(
                self.out,
                "  session {:?} needs a login: `login` opens the browser, `continue` saves it and runs rows {} to {}, `cancel` dismisses",
                request.session_name, request.start_row, request.end_row
            )?;
        }
        Ok(())
    }

    fn print_logs(&mut self) -> io::Result<()> {
        writeln!(self.out, "Log files:")?;
        if self.logs.is_empty() {
            writeln!(self.out, "  (none)")?;
        }
        for item in &self.logs {
            let size = item.size.map(format_file_size).unwrap_or_default();
            let modified = item.modified.as_deref().unwrap_or("");
            writeln!(self.out, "  {:<40} {:>10}  {}", item.file_name, size, modified)?;
        }
        Ok(())
    }

    fn print_sessions(&mut self) -> io::Result<()> {
        writeln!(self.out, "Saved sessions:")?;
        if self.sessions.is_empty() {
            writeln!(self.out, "  (none)")?;
        }
        for item in &self.sessions {
            let modified = item.modified.as_deref().unwrap_or("");
            writeln!(self.out, "  {:<24} {:<32} {}", item.name, item.file_name, modified)?;
        }
        Ok(())
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        match severity {
            Severity::Success => text.green().to_string(),
            Severity::Error => text.red().to_string(),
            Severity::Warning => text.yellow().to_string(),
            Severity::Info => text.cyan().to_string(),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
