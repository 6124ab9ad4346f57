// src/output.rs

//! Terminal rendering of command results
//!
//! Results go to stdout, per-package errors to stderr. Color is off unless
//! requested, and `NO_COLOR` always disables it.

use crate::error::PackageFailure;
use crate::repository::{RemoteMetadata, category_name};
use crate::resolver::ResolutionReport;
use crate::updates::UpdateReport;
use std::io::{self, Write};
use std::path::Path;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Pick the color mode from the `--color` flag and the environment
pub fn color_choice(color: bool) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() || !color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

/// Writes results and errors with optional color
pub struct Printer<O: WriteColor, E: WriteColor> {
    out: O,
    err: E,
    quiet: bool,
    verbose: u8,
}

impl Printer<StandardStream, StandardStream> {
    pub fn stdio(color: bool, quiet: bool, verbose: u8) -> Self {
        let choice = color_choice(color);
        Self::new(
            StandardStream::stdout(choice),
            StandardStream::stderr(choice),
            quiet,
            verbose,
        )
    }
}

impl<O: WriteColor, E: WriteColor> Printer<O, E> {
    pub fn new(out: O, err: E, quiet: bool, verbose: u8) -> Self {
        Self {
            out,
            err,
            quiet,
            verbose,
        }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn styled(&mut self, text: &str, color: Option<Color>, bold: bool) -> io::Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        self.out.set_color(&spec)?;
        write!(self.out, "{}", text)?;
        self.out.reset()
    }

    fn version(&mut self, meta: &RemoteMetadata) -> io::Result<()> {
        let color = if meta.out_of_date {
            Color::Red
        } else {
            Color::Green
        };
        self.styled(&meta.version_release, Some(color), false)
    }

    /// `aur/<name> <version>` with the description indented below
    pub fn search_results(&mut self, results: &[RemoteMetadata]) -> io::Result<()> {
        for meta in results {
            if self.quiet {
                self.styled(&meta.name, None, true)?;
                writeln!(self.out)?;
                continue;
            }
            self.styled("aur", Some(Color::Magenta), false)?;
            write!(self.out, "/")?;
            self.styled(&meta.name, None, true)?;
            write!(self.out, " ")?;
            self.version(meta)?;
            writeln!(self.out)?;
            writeln!(self.out, "    {}", meta.description.as_deref().unwrap_or_default())?;
        }
        self.out.flush()
    }

    /// Detailed information block for one package
    pub fn package_info(&mut self, meta: &RemoteMetadata, page_url: &str) -> io::Result<()> {
        self.field("Repository")?;
        self.styled("aur", Some(Color::Magenta), false)?;
        writeln!(self.out)?;

        self.field("Name")?;
        self.styled(&meta.name, None, true)?;
        writeln!(self.out)?;

        self.field("Version")?;
        self.version(meta)?;
        writeln!(self.out)?;

        self.field("URL")?;
        self.styled(meta.url.as_deref().unwrap_or("None"), Some(Color::Cyan), false)?;
        writeln!(self.out)?;

        self.field("AUR Page")?;
        self.styled(page_url, Some(Color::Cyan), false)?;
        writeln!(self.out)?;

        self.field("Category")?;
        writeln!(self.out, "{}", category_name(meta.category_id))?;

        self.field("Licenses")?;
        if meta.licenses.is_empty() {
            writeln!(self.out, "None")?;
        } else {
            writeln!(self.out, "{}", meta.licenses.join("  "))?;
        }

        self.field("Number of Votes")?;
        writeln!(self.out, "{}", meta.vote_count)?;

        self.field("Out of Date")?;
        writeln!(self.out, "{}", if meta.out_of_date { "Yes" } else { "No" })?;

        self.field("Description")?;
        writeln!(self.out, "{}", meta.description.as_deref().unwrap_or("None"))?;
        writeln!(self.out)?;
        self.out.flush()
    }

    fn field(&mut self, label: &str) -> io::Result<()> {
        write!(self.out, "{:<16}: ", label)
    }

    /// Summary of a download run
    pub fn resolution(&mut self, report: &ResolutionReport) -> io::Result<()> {
        let fetched = &report.result.fetched;
        let local = &report.result.satisfied_locally;
        let dir = report.target_dir.display().to_string();

        if self.quiet {
            for name in fetched {
                writeln!(self.out, "{}", name)?;
            }
            return self.out.flush();
        }

        if !fetched.is_empty() {
            if fetched.len() == 1 && local.is_empty() {
                if let Some(name) = fetched.first() {
                    self.styled(name, None, true)?;
                }
                write!(self.out, " downloaded to ")?;
                self.styled(&dir, Some(Color::Green), false)?;
                writeln!(self.out)?;
            } else {
                write!(self.out, "Packages downloaded to ")?;
                self.styled(&dir, Some(Color::Green), false)?;
                writeln!(self.out, ":")?;
                for name in fetched {
                    write!(self.out, "    ")?;
                    self.styled(name, None, true)?;
                    writeln!(self.out)?;
                }
            }
        }

        if !local.is_empty() {
            if local.len() == 1 && fetched.is_empty() {
                if let Some(name) = local.first() {
                    self.styled(name, None, true)?;
                }
                write!(self.out, " is available in ")?;
                self.styled("pacman repos", Some(Color::Yellow), false)?;
                writeln!(self.out)?;
            } else {
                if !fetched.is_empty() {
                    writeln!(self.out)?;
                }
                write!(self.out, "Dependencies found in ")?;
                self.styled("pacman repos", Some(Color::Yellow), false)?;
                writeln!(self.out, ":")?;
                for name in local {
                    write!(self.out, "    ")?;
                    self.styled(name, None, true)?;
                    writeln!(self.out)?;
                }
            }
        }
        self.out.flush()
    }

    /// Header printed before `update --download` fetches anything
    pub fn downloading_updates(&mut self, target_dir: &Path) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        write!(self.out, "Downloading updates to ")?;
        self.styled(&target_dir.display().to_string(), Some(Color::Green), false)?;
        writeln!(self.out)?;
        self.out.flush()
    }

    /// Available updates, one per line
    pub fn updates(&mut self, report: &UpdateReport) -> io::Result<()> {
        if report.updates.is_empty() {
            if !self.quiet {
                writeln!(self.out, "No updates available")?;
            }
            return self.out.flush();
        }

        for update in &report.updates {
            self.styled(update.name(), None, true)?;
            if !self.quiet {
                write!(self.out, " ")?;
                self.styled(&update.installed_version, Some(Color::Green), false)?;
                if self.verbose >= 1 {
                    write!(self.out, " -> ")?;
                    self.version(&update.metadata)?;
                }
            }
            writeln!(self.out)?;
        }
        self.out.flush()
    }

    /// `error: <package>: <cause>` on stderr
    pub fn failure(&mut self, failure: &PackageFailure) -> io::Result<()> {
        self.error(&failure.to_string())
    }

    pub fn failures(&mut self, failures: &[PackageFailure]) -> io::Result<()> {
        for failure in failures {
            self.failure(failure)?;
        }
        Ok(())
    }

    /// `error: <message>` on stderr
    pub fn error(&mut self, message: &str) -> io::Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(Color::Red)).set_bold(true);
        self.err.set_color(&spec)?;
        write!(self.err, "error:")?;
        self.err.reset()?;
        writeln!(self.err, " {}", message)?;
        self.err.flush()
    }
}
