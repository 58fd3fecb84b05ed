use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use log::info;

use crate::data::{self, ExportFormat};
use crate::presenter::{build_history, render_history};
use crate::scanning::camera::{Camera, Terminal};
use crate::scanning::record::ScanCandidate;
use crate::scanning::session::{Session, SessionState};
use crate::scanning::store::ScanStore;
use crate::scanning::{AutoConfirm, Confirm};

/// Wires the store, the scan session and the terminal together for the CLI
/// commands.
pub struct App<R, W> {
    store: ScanStore,
    terminal: Terminal<R, W>,
    session: Session,
    auto_confirm: bool,
}

impl<R: BufRead, W: Write> App<R, W> {
    pub fn new(store: ScanStore, terminal: Terminal<R, W>, auto_confirm: bool) -> App<R, W> {
        App {
            store,
            terminal,
            session: Session::new(),
            auto_confirm,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.terminal.into_output()
    }

    /// Reads payloads until one decodes, then asks to save it.
    pub fn scan(&mut self) -> Result<()> {
        if !self.session.start_scan(&mut self.terminal) {
            return self.show_banner();
        }

        while self.session.state() == &SessionState::Scanning {
            match self.terminal.next_payload()? {
                Some(payload) => {
                    if !self.session.on_payload(&payload) {
                        self.show_banner()?;
                    }
                },
                None => {
                    info!("scanner input ended without a code");
                    self.session.stop_scan(&mut self.terminal)?;
                },
            }
        }

        self.confirm_pending()
    }

    pub fn add(&mut self, part_no: &str, mrp: &str) -> Result<()> {
        if !self.session.manual_entry(part_no, mrp) {
            return self.show_banner();
        }

        self.confirm_pending()
    }

    pub fn history(&mut self) -> Result<()> {
        let view = build_history(&self.store.load_all()?);
        write!(self.terminal.output(), "{}", render_history(&view))?;

        Ok(())
    }

    pub fn delete(&mut self, date: NaiveDate, part_no: &str, mrp: &str) -> Result<()> {
        let removed = if self.auto_confirm {
            self.store.confirm_and_delete(&mut AutoConfirm(true), date, part_no, mrp)?
        } else {
            self.store.confirm_and_delete(&mut self.terminal, date, part_no, mrp)?
        };

        match removed {
            Some(0) => writeln!(self.terminal.output(), "Nothing matched {} {} {}.", date, part_no, mrp)?,
            Some(_) => self.history()?,
            None => {},
        }

        Ok(())
    }

    /// Returns the written file, or `None` when there was nothing to export.
    pub fn export(&mut self, date: Option<NaiveDate>, format: ExportFormat, out_dir: &Path) -> Result<Option<PathBuf>> {
        let records = self.store.load_all()?;
        match data::export_records(&records, date, format, out_dir) {
            Ok(path) => {
                writeln!(self.terminal.output(), "Exported {}", path.display())?;
                Ok(Some(path))
            },
            Err(err) if err.is_empty_selection() => {
                self.session.notify(err.to_string());
                self.show_banner()?;
                Ok(None)
            },
            Err(err) => Err(err.into()),
        }
    }

    fn confirm_pending(&mut self) -> Result<()> {
        let Some(pending) = self.session.pending() else {
            writeln!(self.terminal.output(), "No code scanned.")?;
            return Ok(());
        };

        let question = confirm_question(pending);
        let accepted = self.auto_confirm || self.terminal.confirm(&question);

        if accepted {
            if let Some(record) = self.session.accept(&mut self.store, &mut self.terminal)? {
                writeln!(
                    self.terminal.output(),
                    "Saved {} (₹{}), quantity {}",
                    record.part_no(),
                    record.mrp(),
                    record.quantity()
                )?;
                self.history()?;
            }
        } else {
            self.session.reject(&mut self.terminal)?;
            writeln!(self.terminal.output(), "Discarded.")?;
        }

        Ok(())
    }

    fn show_banner(&mut self) -> Result<()> {
        if let Some(banner) = self.session.banner() {
            writeln!(self.terminal.output(), "! {}", banner.message())?;
        }

        Ok(())
    }
}

fn confirm_question(pending: &ScanCandidate) -> String {
    format!("Part No: {}\nMRP: ₹{}\nSave this scan?", pending.part_no, pending.mrp)
}
