//! Static lookup tables for the booking wizard.
//!
//! The wizard identifies countries, procedures and offices by numeric
//! codes. These tables are loaded once at startup and passed by
//! reference into the components that need them; nothing in the crate
//! mutates them after construction.

/// A code/name table with lookups in both directions.
#[derive(Debug, Clone, Copy)]
pub struct CodeTable {
    entries: &'static [(u32, &'static str)],
}

impl CodeTable {
    pub const fn new(entries: &'static [(u32, &'static str)]) -> Self {
        CodeTable { entries }
    }

    pub fn contains_code(&self, code: u32) -> bool {
        self.entries.iter().any(|(c, _)| *c == code)
    }

    pub fn name_for(&self, code: u32) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, n)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &'static str)> + '_ {
        self.entries.iter().copied()
    }
}

/// All static tables the process needs, bundled for passing around.
#[derive(Debug, Clone, Copy)]
pub struct Tables {
    pub countries: CodeTable,
    pub procedures: CodeTable,
    /// Offices known ahead of time, keyed by the wizard's office id.
    /// New ids can still appear in server responses; they are logged,
    /// not rejected.
    pub offices: CodeTable,
}

impl Tables {
    pub fn builtin() -> Self {
        Tables {
            countries: CodeTable::new(COUNTRIES),
            procedures: CodeTable::new(PROCEDURES),
            offices: CodeTable::new(OFFICES),
        }
    }
}

impl Default for Tables {
    fn default() -> Self {
        Self::builtin()
    }
}

static COUNTRIES: &[(u32, &str)] = &[
    (101, "ALEMANIA"),
    (104, "ARGELIA"),
    (106, "ARGENTINA"),
    (113, "BOLIVIA"),
    (115, "BRASIL"),
    (123, "COLOMBIA"),
    (133, "CUBA"),
    (137, "ECUADOR"),
    (141, "ESTADOS UNIDOS DE AMERICA"),
    (145, "FILIPINAS"),
    (147, "FRANCIA"),
    (151, "GEORGIA"),
    (155, "HONDURAS"),
    (157, "INDIA"),
    (161, "ITALIA"),
    (169, "MARRUECOS"),
    (173, "MEXICO"),
    (181, "PAKISTAN"),
    (185, "PERU"),
    (193, "REINO UNIDO"),
    (197, "RUSIA"),
    (205, "SENEGAL"),
    (213, "UCRANIA"),
    (217, "VENEZUELA"),
    (257, "CHINA"),
];

static PROCEDURES: &[(u32, &str)] = &[
    (4010, "RECOGIDA DE TARJETA DE IDENTIDAD DE EXTRANJERO (TIE)"),
    (4036, "TOMA DE HUELLAS (EXPEDICION DE TARJETA)"),
    (4037, "RENOVACION DE TARJETA DE LARGA DURACION"),
    (4038, "CERTIFICADOS Y ASIGNACION DE NIE"),
    (4049, "AUTORIZACION DE REGRESO"),
];

static OFFICES: &[(u32, &str)] = &[
    (16, "CNP RAMBLA GUIPUSCOA 74, BARCELONA"),
    (17, "CNP MALLORCA GRAN VIA, BARCELONA"),
    (18, "CNP COMISARIA BADALONA, BADALONA"),
    (19, "CNP COMISARIA CASTELLDEFELS, CASTELLDEFELS"),
    (20, "CNP COMISARIA CERDANYOLA DEL VALLES, CERDANYOLA"),
    (21, "CNP COMISARIA CORNELLA DE LLOBREGAT, CORNELLA"),
    (22, "CNP COMISARIA GRANOLLERS, GRANOLLERS"),
    (23, "CNP COMISARIA IGUALADA, IGUALADA"),
    (24, "CNP COMISARIA MANRESA, MANRESA"),
    (25, "CNP COMISARIA MATARO, MATARO"),
    (26, "CNP COMISARIA SABADELL, SABADELL"),
    (27, "CNP COMISARIA SANTA COLOMA DE GRAMENET, SANTA COLOMA"),
    (28, "CNP COMISARIA TERRASSA, TERRASSA"),
    (29, "CNP COMISARIA VIC, VIC"),
    (30, "CNP COMISARIA VILANOVA I LA GELTRU, VILANOVA"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_resolve_known_codes() {
        let tables = Tables::builtin();
        assert!(tables.countries.contains_code(257));
        assert!(tables.procedures.contains_code(4010));
        assert_eq!(tables.countries.name_for(257), Some("CHINA"));
        assert!(!tables.countries.contains_code(9999));
    }
}
