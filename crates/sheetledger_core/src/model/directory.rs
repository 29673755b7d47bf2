//! Staff directory and department catalog.
//!
//! # Responsibility
//! - Define `DirectoryEntry` and its work-mode classification.
//! - Provide the built-in staff list used when no directory table exists.
//! - Provide the fixed department catalog with display labels.

use serde::{Serialize, Serializer};

/// Sheet layout a staff member works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkMode {
    /// `ESTANDAR`
    Standard,
    /// `HIBRIDO`
    Hybrid,
    /// `VENTAS`
    Sales,
    /// Any label not known to core, kept verbatim.
    Other(String),
}

impl WorkMode {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "" | "ESTANDAR" => Self::Standard,
            "HIBRIDO" => Self::Hybrid,
            "VENTAS" => Self::Sales,
            _ => Self::Other(value.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard => "ESTANDAR",
            Self::Hybrid => "HIBRIDO",
            Self::Sales => "VENTAS",
            Self::Other(label) => label.as_str(),
        }
    }
}

impl Serialize for WorkMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One staff member as listed in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    #[serde(rename = "dept")]
    pub department: String,
    #[serde(rename = "type")]
    pub work_mode: WorkMode,
}

impl DirectoryEntry {
    pub fn new(
        name: impl Into<String>,
        department: impl Into<String>,
        work_mode: WorkMode,
    ) -> Self {
        Self {
            name: name.into(),
            department: department.into(),
            work_mode,
        }
    }
}

/// Department key with its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Department {
    pub key: &'static str,
    pub label: &'static str,
}

pub const DEPARTMENTS: &[Department] = &[
    Department {
        key: "CONSTRUCCION",
        label: "Construcción",
    },
    Department {
        key: "COMPRAS",
        label: "Compras/Almacén",
    },
    Department {
        key: "EHS",
        label: "Seguridad (EHS)",
    },
    Department {
        key: "DISEÑO",
        label: "Diseño & Ing.",
    },
    Department {
        key: "ELECTROMECANICA",
        label: "Electromecánica",
    },
    Department {
        key: "HVAC",
        label: "HVAC",
    },
    Department {
        key: "ADMINISTRACION",
        label: "Administración",
    },
    Department {
        key: "VENTAS",
        label: "Ventas",
    },
    Department {
        key: "MAQUINARIA",
        label: "Maquinaria",
    },
];

const BUILTIN_STAFF: &[(&str, &str, WorkMode)] = &[
    ("ANTONIA_VENTAS", "VENTAS", WorkMode::Sales),
    ("JUDITH ECHAVARRIA", "VENTAS", WorkMode::Standard),
    ("EDUARDO MANZANARES", "VENTAS", WorkMode::Standard),
    ("RAMIRO RODRIGUEZ", "VENTAS", WorkMode::Hybrid),
    ("SEBASTIAN PADILLA", "VENTAS", WorkMode::Standard),
    ("CESAR GOMEZ", "VENTAS", WorkMode::Standard),
    ("ALFONSO CORREA", "VENTAS", WorkMode::Standard),
    ("TERESA GARZA", "VENTAS", WorkMode::Hybrid),
    ("GUILLERMO DAMICO", "VENTAS", WorkMode::Standard),
    ("ANGEL SALINAS", "VENTAS", WorkMode::Hybrid),
    ("JUAN JOSE SANCHEZ", "VENTAS", WorkMode::Standard),
    ("LUIS CARLOS", "ADMINISTRACION", WorkMode::Standard),
    ("ANTONIO SALAZAR", "ADMINISTRACION", WorkMode::Standard),
    ("ROCIO CASTRO", "ADMINISTRACION", WorkMode::Standard),
    ("DANIA GONZALEZ", "ADMINISTRACION", WorkMode::Standard),
    ("JUANY RODRIGUEZ", "ADMINISTRACION", WorkMode::Standard),
    ("LAURA HUERTA", "ADMINISTRACION", WorkMode::Standard),
    ("LILIANA MARTINEZ", "ADMINISTRACION", WorkMode::Standard),
    ("DANIELA CASTRO", "ADMINISTRACION", WorkMode::Standard),
    ("EDUARDO BENITEZ", "ADMINISTRACION", WorkMode::Standard),
    ("ANTONIO CABRERA", "ADMINISTRACION", WorkMode::Standard),
    ("ADMINISTRADOR", "ADMINISTRACION", WorkMode::Hybrid),
    ("EDUARDO MANZANARES", "HVAC", WorkMode::Standard),
    ("JUAN JOSE SANCHEZ", "HVAC", WorkMode::Standard),
    ("SELENE BALDONADO", "HVAC", WorkMode::Standard),
    ("ROLANDO MORENO", "HVAC", WorkMode::Standard),
    ("MIGUEL GALLARDO", "ELECTROMECANICA", WorkMode::Standard),
    ("SEBASTIAN PADILLA", "ELECTROMECANICA", WorkMode::Standard),
    ("JEHU MARTINEZ", "ELECTROMECANICA", WorkMode::Standard),
    ("MIGUEL GONZALEZ", "ELECTROMECANICA", WorkMode::Standard),
    ("ALICIA RIVERA", "ELECTROMECANICA", WorkMode::Standard),
    ("RICARDO MENDO", "CONSTRUCCION", WorkMode::Standard),
    ("CARLOS MENDEZ", "CONSTRUCCION", WorkMode::Standard),
    ("REYNALDO GARCIA", "CONSTRUCCION", WorkMode::Standard),
    ("INGE OLIVO", "CONSTRUCCION", WorkMode::Standard),
    ("EDUARDO TERAN", "CONSTRUCCION", WorkMode::Hybrid),
    ("EDGAR HOLT", "CONSTRUCCION", WorkMode::Standard),
    ("ALEXIS TORRES", "CONSTRUCCION", WorkMode::Standard),
    ("TERESA GARZA", "CONSTRUCCION", WorkMode::Hybrid),
    ("RAMIRO RODRIGUEZ", "CONSTRUCCION", WorkMode::Hybrid),
    ("GUILLERMO DAMICO", "CONSTRUCCION", WorkMode::Standard),
    ("RUBEN PESQUEDA", "CONSTRUCCION", WorkMode::Standard),
    ("JUDITH ECHAVARRIA", "COMPRAS", WorkMode::Standard),
    ("GISELA DOMINGUEZ", "COMPRAS", WorkMode::Standard),
    ("VANESSA DE LARA", "COMPRAS", WorkMode::Standard),
    ("NELSON MALDONADO", "COMPRAS", WorkMode::Standard),
    ("VICTOR ALMACEN", "COMPRAS", WorkMode::Standard),
    ("DIMAS RAMOS", "EHS", WorkMode::Standard),
    ("CITLALI GOMEZ", "EHS", WorkMode::Standard),
    ("AIMEE RAMIREZ", "EHS", WorkMode::Standard),
    ("EDGAR HOLT", "MAQUINARIA", WorkMode::Standard),
    ("ALEXIS TORRES", "MAQUINARIA", WorkMode::Standard),
    ("ANGEL SALINAS", "DISEÑO", WorkMode::Hybrid),
    ("EDGAR HOLT", "DISEÑO", WorkMode::Standard),
    ("EDGAR LOPEZ", "DISEÑO", WorkMode::Hybrid),
];

/// Returns the built-in staff list.
pub fn builtin_directory() -> Vec<DirectoryEntry> {
    BUILTIN_STAFF
        .iter()
        .map(|(name, dept, mode)| DirectoryEntry::new(*name, *dept, mode.clone()))
        .collect()
}
