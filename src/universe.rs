use serde::Serialize;

/// One row of the curated energy-sector universe.
#[derive(Debug, Clone, Serialize)]
pub struct UniverseEntry {
    pub ticker: &'static str,
    pub name: &'static str,
    pub region: &'static str,
}

/// Curated energy majors grouped by listing region. Tickers use Yahoo
/// suffix conventions (.NS, .MC, .T, .SR) where the primary listing is
/// outside the US.
pub const ENERGY_UNIVERSE: &[UniverseEntry] = &[
    UniverseEntry { ticker: "XOM", name: "Exxon Mobil", region: "US" },
    UniverseEntry { ticker: "CVX", name: "Chevron", region: "US" },
    UniverseEntry { ticker: "COP", name: "ConocoPhillips", region: "US" },
    UniverseEntry { ticker: "OXY", name: "Occidental Petroleum", region: "US" },
    UniverseEntry { ticker: "PSX", name: "Phillips 66", region: "US" },
    UniverseEntry { ticker: "SHEL", name: "Shell", region: "Europe" },
    UniverseEntry { ticker: "BP", name: "BP", region: "Europe" },
    UniverseEntry { ticker: "TTE", name: "TotalEnergies", region: "Europe" },
    UniverseEntry { ticker: "E", name: "Eni", region: "Europe" },
    UniverseEntry { ticker: "EQNR", name: "Equinor", region: "Europe" },
    UniverseEntry { ticker: "REP.MC", name: "Repsol", region: "Europe" },
    UniverseEntry { ticker: "RELIANCE.NS", name: "Reliance Industries", region: "India" },
    UniverseEntry { ticker: "IOC.NS", name: "Indian Oil", region: "India" },
    UniverseEntry { ticker: "ONGC.NS", name: "Oil & Natural Gas Corporation", region: "India" },
    UniverseEntry { ticker: "BPCL.NS", name: "Bharat Petroleum", region: "India" },
    UniverseEntry { ticker: "HINDPETRO.NS", name: "Hindustan Petroleum", region: "India" },
    UniverseEntry { ticker: "GAIL.NS", name: "GAIL (India)", region: "India" },
    UniverseEntry { ticker: "PBR", name: "Petrobras", region: "Other" },
    UniverseEntry { ticker: "EC", name: "Ecopetrol", region: "Other" },
    UniverseEntry { ticker: "SU", name: "Suncor Energy", region: "Other" },
    UniverseEntry { ticker: "CNQ", name: "Canadian Natural Resources", region: "Other" },
    UniverseEntry { ticker: "IMO", name: "Imperial Oil", region: "Other" },
    UniverseEntry { ticker: "5020.T", name: "ENEOS Holdings", region: "Other" },
    UniverseEntry { ticker: "1605.T", name: "INPEX", region: "Other" },
    UniverseEntry { ticker: "2222.SR", name: "Saudi Aramco", region: "Other" },
];

pub fn all_tickers() -> Vec<&'static str> {
    ENERGY_UNIVERSE.iter().map(|e| e.ticker).collect()
}

pub fn lookup(ticker: &str) -> Option<&'static UniverseEntry> {
    ENERGY_UNIVERSE
        .iter()
        .find(|e| e.ticker.eq_ignore_ascii_case(ticker))
}

pub fn contains(ticker: &str) -> bool {
    lookup(ticker).is_some()
}
