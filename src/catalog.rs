/// Fixed registries for the electrification pipeline.
///
/// Defines the canonical list of states fetched from the EIA State Energy
/// Data System (SEDS), the series catalog mapping SEDS MSN codes to store
/// tables, and the quotient catalog describing every derived table. This is
/// the single source of truth for table names: SQL text is only ever built
/// from `Table::name()`, never from caller-supplied strings.

use std::fmt;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Every table in the store. The variant set is the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Electricity,
    Energy,
    EndUseEnergy,
    Electrification,
    ElectricityPrice,
    EnergyPrice,
    EnergyPriceShare,
    ElectricityPriceShare,
    Gdp,
    Population,
    GdpPerCapita,
    ElectricityImports,
    ResidentialEnergy,
    ResidentialElectricity,
    ResidentialElectrification,
    CommercialEnergy,
    CommercialElectricity,
    CommercialElectrification,
    IndustrialEnergy,
    IndustrialElectricity,
    IndustrialElectrification,
    TransportationEnergy,
    TransportationElectricity,
    TransportationElectrification,
    ElectricEnergy,
    ElectricElectricity,
    ElectricElectrification,
    TransportationShare,
    IndustrialShare,
    CommercialShare,
    ResidentialShare,
    ElectricShare,
}

impl Table {
    pub const ALL: [Table; 32] = [
        Table::Electricity,
        Table::Energy,
        Table::EndUseEnergy,
        Table::Electrification,
        Table::ElectricityPrice,
        Table::EnergyPrice,
        Table::EnergyPriceShare,
        Table::ElectricityPriceShare,
        Table::Gdp,
        Table::Population,
        Table::GdpPerCapita,
        Table::ElectricityImports,
        Table::ResidentialEnergy,
        Table::ResidentialElectricity,
        Table::ResidentialElectrification,
        Table::CommercialEnergy,
        Table::CommercialElectricity,
        Table::CommercialElectrification,
        Table::IndustrialEnergy,
        Table::IndustrialElectricity,
        Table::IndustrialElectrification,
        Table::TransportationEnergy,
        Table::TransportationElectricity,
        Table::TransportationElectrification,
        Table::ElectricEnergy,
        Table::ElectricElectricity,
        Table::ElectricElectrification,
        Table::TransportationShare,
        Table::IndustrialShare,
        Table::CommercialShare,
        Table::ResidentialShare,
        Table::ElectricShare,
    ];

    /// The SQL table name. These names are the contract between stages and
    /// must not change.
    pub fn name(self) -> &'static str {
        match self {
            Table::Electricity => "electricity",
            Table::Energy => "energy",
            Table::EndUseEnergy => "end_use_energy",
            Table::Electrification => "electrification",
            Table::ElectricityPrice => "electricity_price",
            Table::EnergyPrice => "energy_price",
            Table::EnergyPriceShare => "energy_price_share",
            Table::ElectricityPriceShare => "electricity_price_share",
            Table::Gdp => "gdp",
            Table::Population => "population",
            Table::GdpPerCapita => "gdp_per_capita",
            Table::ElectricityImports => "electricity_imports",
            Table::ResidentialEnergy => "residential_energy",
            Table::ResidentialElectricity => "residential_electricity",
            Table::ResidentialElectrification => "residential_electrification",
            Table::CommercialEnergy => "commercial_energy",
            Table::CommercialElectricity => "commercial_electricity",
            Table::CommercialElectrification => "commercial_electrification",
            Table::IndustrialEnergy => "industrial_energy",
            Table::IndustrialElectricity => "industrial_electricity",
            Table::IndustrialElectrification => "industrial_electrification",
            Table::TransportationEnergy => "transportation_energy",
            Table::TransportationElectricity => "transportation_electricity",
            Table::TransportationElectrification => "transportation_electrification",
            Table::ElectricEnergy => "electric_energy",
            Table::ElectricElectricity => "electric_electricity",
            Table::ElectricElectrification => "electric_electrification",
            Table::TransportationShare => "transportation_share",
            Table::IndustrialShare => "industrial_share",
            Table::CommercialShare => "commercial_share",
            Table::ResidentialShare => "residential_share",
            Table::ElectricShare => "electric_share",
        }
    }

    /// Validates an arbitrary name against the allow-list.
    pub fn from_name(name: &str) -> Option<Table> {
        Table::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Whether this table is computed from two other tables.
    pub fn is_derived(self) -> bool {
        derived_tables().contains(&self)
    }

    /// Whether any stage writes rows into this table. `energy_price_share`
    /// is part of the schema but nothing fills it.
    pub fn is_produced(self) -> bool {
        self.is_derived() || primary_tables().contains(&self)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// The national aggregate as it appears in the `State` column.
pub const NATIONAL: &str = "United States";

/// District of Columbia, excluded from the GDP regression as an outlier.
pub const DISTRICT_OF_COLUMBIA: &str = "District of Columbia";

/// A state as stored (`name`) and as addressed by SEDS (`code`).
pub struct State {
    pub name: &'static str,
    /// Two-letter postal code, `US` for the national aggregate.
    pub code: &'static str,
}

/// 50 states, the District of Columbia, and the national aggregate.
pub static STATE_REGISTRY: &[State] = &[
    State { name: "Alabama", code: "AL" },
    State { name: "Alaska", code: "AK" },
    State { name: "Arizona", code: "AZ" },
    State { name: "Arkansas", code: "AR" },
    State { name: "California", code: "CA" },
    State { name: "Colorado", code: "CO" },
    State { name: "Connecticut", code: "CT" },
    State { name: "Delaware", code: "DE" },
    State { name: "District of Columbia", code: "DC" },
    State { name: "Florida", code: "FL" },
    State { name: "Georgia", code: "GA" },
    State { name: "Hawaii", code: "HI" },
    State { name: "Idaho", code: "ID" },
    State { name: "Illinois", code: "IL" },
    State { name: "Indiana", code: "IN" },
    State { name: "Iowa", code: "IA" },
    State { name: "Kansas", code: "KS" },
    State { name: "Kentucky", code: "KY" },
    State { name: "Louisiana", code: "LA" },
    State { name: "Maine", code: "ME" },
    State { name: "Maryland", code: "MD" },
    State { name: "Massachusetts", code: "MA" },
    State { name: "Michigan", code: "MI" },
    State { name: "Minnesota", code: "MN" },
    State { name: "Mississippi", code: "MS" },
    State { name: "Missouri", code: "MO" },
    State { name: "Montana", code: "MT" },
    State { name: "Nebraska", code: "NE" },
    State { name: "Nevada", code: "NV" },
    State { name: "New Hampshire", code: "NH" },
    State { name: "New Jersey", code: "NJ" },
    State { name: "New Mexico", code: "NM" },
    State { name: "New York", code: "NY" },
    State { name: "North Carolina", code: "NC" },
    State { name: "North Dakota", code: "ND" },
    State { name: "Ohio", code: "OH" },
    State { name: "Oklahoma", code: "OK" },
    State { name: "Oregon", code: "OR" },
    State { name: "Pennsylvania", code: "PA" },
    State { name: "Rhode Island", code: "RI" },
    State { name: "South Carolina", code: "SC" },
    State { name: "South Dakota", code: "SD" },
    State { name: "Tennessee", code: "TN" },
    State { name: "Texas", code: "TX" },
    State { name: "United States", code: "US" },
    State { name: "Utah", code: "UT" },
    State { name: "Vermont", code: "VT" },
    State { name: "Virginia", code: "VA" },
    State { name: "Washington", code: "WA" },
    State { name: "West Virginia", code: "WV" },
    State { name: "Wisconsin", code: "WI" },
    State { name: "Wyoming", code: "WY" },
];

// ---------------------------------------------------------------------------
// Series catalog
// ---------------------------------------------------------------------------

/// A primary series fetched from SEDS.
pub struct SeriesSpec {
    /// SEDS mnemonic series name (MSN), e.g. `TETCB`.
    pub msn: &'static str,
    pub table: Table,
    pub description: &'static str,
}

/// Every primary series, in fetch order.
pub static SERIES_CATALOG: &[SeriesSpec] = &[
    SeriesSpec { msn: "TEEIB", table: Table::ElectricEnergy, description: "Total energy consumed by the electric power sector" },
    SeriesSpec { msn: "TETXB", table: Table::EndUseEnergy, description: "Total end-use energy consumption" },
    SeriesSpec { msn: "ELISP", table: Table::ElectricityImports, description: "Net interstate flow of electricity" },
    SeriesSpec { msn: "GDPRX", table: Table::Gdp, description: "Real gross domestic product" },
    SeriesSpec { msn: "TPOPP", table: Table::Population, description: "Resident population" },
    SeriesSpec { msn: "ESTCD", table: Table::ElectricityPrice, description: "Average electricity price, all sectors" },
    SeriesSpec { msn: "TETCD", table: Table::EnergyPrice, description: "Average energy price, all sectors" },
    SeriesSpec { msn: "ESTCB", table: Table::Electricity, description: "Electricity total consumption" },
    SeriesSpec { msn: "TETCB", table: Table::Energy, description: "Total energy consumption" },
    SeriesSpec { msn: "TEACB", table: Table::TransportationEnergy, description: "Transportation sector energy consumption" },
    SeriesSpec { msn: "ESACB", table: Table::TransportationElectricity, description: "Transportation sector electricity consumption" },
    SeriesSpec { msn: "TEICB", table: Table::IndustrialEnergy, description: "Industrial sector energy consumption" },
    SeriesSpec { msn: "ESICB", table: Table::IndustrialElectricity, description: "Industrial sector electricity consumption" },
    SeriesSpec { msn: "TECCB", table: Table::CommercialEnergy, description: "Commercial sector energy consumption" },
    SeriesSpec { msn: "ESCCB", table: Table::CommercialElectricity, description: "Commercial sector electricity consumption" },
    SeriesSpec { msn: "TERCB", table: Table::ResidentialEnergy, description: "Residential sector energy consumption" },
    SeriesSpec { msn: "ESRCB", table: Table::ResidentialElectricity, description: "Residential sector electricity consumption" },
];

/// Tables filled with zeros for every state and year instead of fetched.
/// The electric power sector consumes no delivered electricity.
pub static ZERO_FILLED: &[Table] = &[Table::ElectricElectricity];

/// Tables loaded by ingestion: every fetched series, then the zero-filled
/// tables.
pub fn primary_tables() -> Vec<Table> {
    SERIES_CATALOG
        .iter()
        .map(|spec| spec.table)
        .chain(ZERO_FILLED.iter().copied())
        .collect()
}

// ---------------------------------------------------------------------------
// Quotient catalog
// ---------------------------------------------------------------------------

/// A derived table: `table = numerator / denominator` on `(State, Year)`.
pub struct Quotient {
    pub numerator: Table,
    pub denominator: Table,
    pub table: Table,
}

/// Every derived table, computed after all primary series are loaded.
pub static QUOTIENT_CATALOG: &[Quotient] = &[
    Quotient { numerator: Table::Electricity, denominator: Table::Energy, table: Table::Electrification },
    Quotient { numerator: Table::ElectricityPrice, denominator: Table::EnergyPrice, table: Table::ElectricityPriceShare },
    Quotient { numerator: Table::Gdp, denominator: Table::Population, table: Table::GdpPerCapita },
    Quotient { numerator: Table::ResidentialElectricity, denominator: Table::ResidentialEnergy, table: Table::ResidentialElectrification },
    Quotient { numerator: Table::CommercialElectricity, denominator: Table::CommercialEnergy, table: Table::CommercialElectrification },
    Quotient { numerator: Table::IndustrialElectricity, denominator: Table::IndustrialEnergy, table: Table::IndustrialElectrification },
    Quotient { numerator: Table::TransportationElectricity, denominator: Table::TransportationEnergy, table: Table::TransportationElectrification },
    Quotient { numerator: Table::ElectricElectricity, denominator: Table::ElectricEnergy, table: Table::ElectricElectrification },
    Quotient { numerator: Table::TransportationEnergy, denominator: Table::Energy, table: Table::TransportationShare },
    Quotient { numerator: Table::IndustrialEnergy, denominator: Table::Energy, table: Table::IndustrialShare },
    Quotient { numerator: Table::CommercialEnergy, denominator: Table::Energy, table: Table::CommercialShare },
    Quotient { numerator: Table::ResidentialEnergy, denominator: Table::Energy, table: Table::ResidentialShare },
    Quotient { numerator: Table::ElectricEnergy, denominator: Table::Energy, table: Table::ElectricShare },
];

/// Tables computed by the quotient pass, in catalog order.
pub fn derived_tables() -> Vec<Table> {
    QUOTIENT_CATALOG.iter().map(|q| q.table).collect()
}

// ---------------------------------------------------------------------------
// End-use sectors
// ---------------------------------------------------------------------------

/// The four end-use sectors used by the variance decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sector {
    Residential,
    Commercial,
    Industrial,
    Transportation,
}

impl Sector {
    pub const ALL: [Sector; 4] = [
        Sector::Residential,
        Sector::Commercial,
        Sector::Industrial,
        Sector::Transportation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Sector::Residential => "Residential",
            Sector::Commercial => "Commercial",
            Sector::Industrial => "Industrial",
            Sector::Transportation => "Transportation",
        }
    }

    /// Sector energy as a share of total energy.
    pub fn share_table(self) -> Table {
        match self {
            Sector::Residential => Table::ResidentialShare,
            Sector::Commercial => Table::CommercialShare,
            Sector::Industrial => Table::IndustrialShare,
            Sector::Transportation => Table::TransportationShare,
        }
    }

    pub fn electricity_table(self) -> Table {
        match self {
            Sector::Residential => Table::ResidentialElectricity,
            Sector::Commercial => Table::CommercialElectricity,
            Sector::Industrial => Table::IndustrialElectricity,
            Sector::Transportation => Table::TransportationElectricity,
        }
    }

    pub fn energy_table(self) -> Table {
        match self {
            Sector::Residential => Table::ResidentialEnergy,
            Sector::Commercial => Table::CommercialEnergy,
            Sector::Industrial => Table::IndustrialEnergy,
            Sector::Transportation => Table::TransportationEnergy,
        }
    }

    pub fn electrification_table(self) -> Table {
        match self {
            Sector::Residential => Table::ResidentialElectrification,
            Sector::Commercial => Table::CommercialElectrification,
            Sector::Industrial => Table::IndustrialElectrification,
            Sector::Transportation => Table::TransportationElectrification,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
