use crate::core::config::data::{path_display, Config};
use std::io::{self, Write};

impl Config {
    pub fn print_all<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Current configuration:")?;
        match &self.base_url {
            Some(url) => writeln!(out, "  base-url: {url}")?,
            None => writeln!(out, "  base-url: (unset)")?,
        }
        match &self.storage {
            Some(storage) => writeln!(out, "  storage: {storage}")?,
            None => writeln!(out, "  storage: (unset, using {})", self.storage_kind())?,
        }
        match &self.data_dir {
            Some(dir) => writeln!(out, "  data-dir: {}", path_display(dir))?,
            None => writeln!(out, "  data-dir: (unset)")?,
        }
        Ok(())
    }
}
