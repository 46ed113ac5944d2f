//! Database handle.
//!
//! [`Database`] owns the open page file and the catalog read at open
//! time; tables are opened by name against it. A handle is not meant
//! to be shared across threads — open independent handles on the same
//! path instead, which is safe because all reads are positional and
//! the file is opened read-only.

use std::path::Path;

use crate::jet::catalog::{read_catalog, CatalogEntry};
use crate::jet::pagefile::{JetVersion, PageFile};
use crate::jet::rows::Table;
use crate::jet::table::TableDef;
use crate::jet::value::ValueFormat;
use crate::MdbError;

/// An open Jet database with its catalog.
pub struct Database {
    file: PageFile,
    catalog: Vec<CatalogEntry>,
    value_format: ValueFormat,
}

impl Database {
    /// Open a database file and read its catalog.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MdbError> {
        let mut file = PageFile::open(path)?;
        let value_format = ValueFormat::default();
        let catalog = read_catalog(&mut file, &value_format, None)?;
        Ok(Database {
            file,
            catalog,
            value_format,
        })
    }

    /// The catalog entries, in MSysObjects order.
    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    /// All catalog entries (alias used by the CLI surface).
    pub fn list_tables(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    /// The entries that are plain user tables.
    pub fn user_tables(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.catalog.iter().filter(|e| e.is_user_table())
    }

    /// The detected format version.
    pub fn version(&self) -> JetVersion {
        self.file.version()
    }

    /// The underlying page file.
    pub fn file(&self) -> &PageFile {
        &self.file
    }

    /// Replace the value rendering configuration.
    pub fn set_value_format(&mut self, value_format: ValueFormat) {
        self.value_format = value_format;
    }

    /// Open the named table for scanning.
    pub fn open_table(&mut self, name: &str) -> Result<Table<'_>, MdbError> {
        let root_page = self
            .catalog
            .iter()
            .find(|e| e.object_name == name)
            .map(|e| e.table_pg)
            .ok_or_else(|| MdbError::Argument(format!("Table '{}' not found", name)))?;

        let def = TableDef::read(&mut self.file, name, root_page)?;
        Ok(Table::new(&mut self.file, def, self.value_format.clone()))
    }
}
