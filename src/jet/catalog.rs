//! Catalog bootstrap.
//!
//! Every database describes itself through the MSysObjects system
//! table, whose definition always roots at page 2. The catalog reader
//! synthesizes an entry for it, opens it like any other table, binds
//! the columns it needs by name, and materializes one [`CatalogEntry`]
//! per object row.

use serde::Serialize;

use crate::jet::codec::{get_u16, get_u32};
use crate::jet::constants::{CATALOG_ROOT_PAGE, CATALOG_SYSTEM_FLAGS};
use crate::jet::pagefile::PageFile;
use crate::jet::rows::Table;
use crate::jet::table::TableDef;
use crate::jet::value::ValueFormat;
use crate::MdbError;

/// Object kinds stored in the catalog's Type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectType {
    Form,
    Table,
    Macro,
    SystemTable,
    Report,
    Query,
    LinkedTable,
    Module,
    Relationship,
    DatabaseProperty,
    Unknown(u8),
}

impl ObjectType {
    /// Map a masked Type value to an `ObjectType`.
    pub fn from_u8(val: u8) -> Self {
        match val {
            0 => ObjectType::Form,
            1 => ObjectType::Table,
            2 => ObjectType::Macro,
            3 => ObjectType::SystemTable,
            4 => ObjectType::Report,
            5 => ObjectType::Query,
            6 => ObjectType::LinkedTable,
            7 => ObjectType::Module,
            11 => ObjectType::DatabaseProperty,
            8 => ObjectType::Relationship,
            other => ObjectType::Unknown(other),
        }
    }

    /// Human-readable kind name.
    pub fn name(&self) -> &'static str {
        match self {
            ObjectType::Form => "form",
            ObjectType::Table => "table",
            ObjectType::Macro => "macro",
            ObjectType::SystemTable => "system table",
            ObjectType::Report => "report",
            ObjectType::Query => "query",
            ObjectType::LinkedTable => "linked table",
            ObjectType::Module => "module",
            ObjectType::Relationship => "relationship",
            ObjectType::DatabaseProperty => "database property",
            ObjectType::Unknown(_) => "unknown",
        }
    }
}

/// One object from the system catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    /// Object name.
    pub object_name: String,
    /// Object type with the high bit masked off.
    pub object_type: u8,
    /// Root page of the object's definition (low 24 bits of Id).
    pub table_pg: u32,
    /// Raw catalog flags.
    pub flags: u32,
}

impl CatalogEntry {
    /// Whether this entry is a plain user table: a TABLE-typed object
    /// with no system or linked flag bits set.
    pub fn is_user_table(&self) -> bool {
        self.object_type == 1 && self.flags & CATALOG_SYSTEM_FLAGS == 0
    }

    /// The entry's object kind.
    pub fn kind(&self) -> ObjectType {
        ObjectType::from_u8(self.object_type)
    }
}

/// Read the catalog by scanning MSysObjects.
///
/// `type_filter` restricts the listing to one raw Type value; `None`
/// lists every object.
pub fn read_catalog(
    file: &mut PageFile,
    value_format: &ValueFormat,
    type_filter: Option<u8>,
) -> Result<Vec<CatalogEntry>, MdbError> {
    let def = TableDef::read(file, "MSysObjects", CATALOG_ROOT_PAGE)?;

    let bind = |name: &str| {
        def.column_index(name).ok_or_else(|| {
            MdbError::Parse(format!(
                "Cannot bind column {} of MSysObjects ({} columns found)",
                name,
                def.num_cols
            ))
        })
    };
    let id_col = bind("Id")?;
    let name_col = bind("Name")?;
    let type_col = bind("Type")?;
    let flags_col = bind("Flags")?;
    // Bound for parity with property loading, which reads LvProp.
    bind("LvProp")?;

    let mut table = Table::new(file, def, value_format.clone());
    table.rewind();

    let mut catalog = Vec::new();
    while table.fetch_row()? {
        let buf = table.file().buf();
        let fields = table.fields();

        let type_field = fields[type_col];
        if type_field.is_null {
            continue;
        }
        let raw_type = get_u16(buf, type_field.start);
        if let Some(filter) = type_filter {
            if raw_type != filter as u16 {
                continue;
            }
        }

        let name_field = fields[name_col];
        let object_name = if name_field.is_null {
            String::new()
        } else {
            table
                .file()
                .decode_text(&buf[name_field.start..name_field.start + name_field.size])
        };

        let id_field = fields[id_col];
        let table_pg = if id_field.is_null {
            0
        } else {
            get_u32(buf, id_field.start) & 0x00FF_FFFF
        };

        let flags_field = fields[flags_col];
        let flags = if flags_field.is_null {
            u32::MAX
        } else {
            get_u32(buf, flags_field.start)
        };

        catalog.push(CatalogEntry {
            object_name,
            object_type: (raw_type & 0x7F) as u8,
            table_pg,
            flags,
        });
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(object_type: u8, flags: u32) -> CatalogEntry {
        CatalogEntry {
            object_name: "T".to_string(),
            object_type,
            table_pg: 3,
            flags,
        }
    }

    #[test]
    fn test_user_table_predicate() {
        assert!(entry(1, 0).is_user_table());
        assert!(entry(1, 0x10).is_user_table());
        assert!(!entry(1, 0x80000000).is_user_table());
        assert!(!entry(1, 0x00000002).is_user_table());
        assert!(!entry(1, 0x80000002).is_user_table());
        assert!(!entry(3, 0).is_user_table());
    }

    #[test]
    fn test_object_type_names() {
        assert_eq!(ObjectType::from_u8(1), ObjectType::Table);
        assert_eq!(ObjectType::from_u8(3).name(), "system table");
        assert_eq!(ObjectType::from_u8(99), ObjectType::Unknown(99));
    }
}
