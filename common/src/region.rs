use serde::{Deserialize, Serialize};

/// World regions articles are collected for.
///
/// Serialized in snake_case, matching the region names carried in task
/// messages and storage keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    NorthAmerica,
    Europe,
    AsiaPacific,
    LatinAmerica,
    MiddleEast,
    Africa,
    Oceania,
    SouthAsia,
    SoutheastAsia,
}

impl Region {
    pub const ALL: [Region; 9] = [
        Region::NorthAmerica,
        Region::Europe,
        Region::AsiaPacific,
        Region::LatinAmerica,
        Region::MiddleEast,
        Region::Africa,
        Region::Oceania,
        Region::SouthAsia,
        Region::SoutheastAsia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "north_america",
            Region::Europe => "europe",
            Region::AsiaPacific => "asia_pacific",
            Region::LatinAmerica => "latin_america",
            Region::MiddleEast => "middle_east",
            Region::Africa => "africa",
            Region::Oceania => "oceania",
            Region::SouthAsia => "south_asia",
            Region::SoutheastAsia => "southeast_asia",
        }
    }

    /// GDELT `sourcecountry` filter covering the region's major news markets.
    pub fn source_filter(&self) -> &'static str {
        match self {
            Region::NorthAmerica => {
                "sourcecountry:UnitedStates OR sourcecountry:Canada OR sourcecountry:Mexico"
            }
            Region::Europe => {
                "sourcecountry:UnitedKingdom OR sourcecountry:Germany OR sourcecountry:France \
                 OR sourcecountry:Italy OR sourcecountry:Spain OR sourcecountry:Netherlands \
                 OR sourcecountry:Sweden OR sourcecountry:Norway OR sourcecountry:Denmark \
                 OR sourcecountry:Finland OR sourcecountry:Poland OR sourcecountry:Switzerland \
                 OR sourcecountry:Belgium OR sourcecountry:Austria OR sourcecountry:Ireland \
                 OR sourcecountry:Portugal OR sourcecountry:Greece OR sourcecountry:CzechRepublic \
                 OR sourcecountry:Romania OR sourcecountry:Hungary"
            }
            Region::AsiaPacific => {
                "sourcecountry:India OR sourcecountry:China OR sourcecountry:Japan \
                 OR sourcecountry:SouthKorea OR sourcecountry:Australia OR sourcecountry:NewZealand \
                 OR sourcecountry:Singapore OR sourcecountry:Malaysia OR sourcecountry:Thailand \
                 OR sourcecountry:Vietnam OR sourcecountry:Indonesia OR sourcecountry:Philippines"
            }
            Region::LatinAmerica => {
                "sourcecountry:Brazil OR sourcecountry:Argentina OR sourcecountry:Chile \
                 OR sourcecountry:Colombia OR sourcecountry:Mexico OR sourcecountry:Peru \
                 OR sourcecountry:Venezuela OR sourcecountry:Ecuador OR sourcecountry:Bolivia \
                 OR sourcecountry:Uruguay OR sourcecountry:Paraguay"
            }
            Region::MiddleEast => {
                "sourcecountry:SaudiArabia OR sourcecountry:UnitedArabEmirates \
                 OR sourcecountry:Israel OR sourcecountry:Turkey OR sourcecountry:Egypt \
                 OR sourcecountry:Qatar OR sourcecountry:Kuwait OR sourcecountry:Bahrain \
                 OR sourcecountry:Oman OR sourcecountry:Jordan OR sourcecountry:Lebanon \
                 OR sourcecountry:Iran OR sourcecountry:Iraq OR sourcecountry:Syria \
                 OR sourcecountry:Yemen"
            }
            Region::Africa => {
                "sourcecountry:Nigeria OR sourcecountry:SouthAfrica OR sourcecountry:Egypt \
                 OR sourcecountry:Kenya OR sourcecountry:Ethiopia OR sourcecountry:Ghana \
                 OR sourcecountry:Tanzania OR sourcecountry:Uganda OR sourcecountry:Morocco \
                 OR sourcecountry:Algeria OR sourcecountry:Angola OR sourcecountry:Sudan \
                 OR sourcecountry:Cameroon OR sourcecountry:CoteDIvoire OR sourcecountry:Senegal"
            }
            Region::Oceania => {
                "sourcecountry:Australia OR sourcecountry:NewZealand OR sourcecountry:Fiji \
                 OR sourcecountry:PapuaNewGuinea OR sourcecountry:Samoa OR sourcecountry:Tonga"
            }
            Region::SouthAsia => {
                "sourcecountry:India OR sourcecountry:Pakistan OR sourcecountry:Bangladesh \
                 OR sourcecountry:SriLanka OR sourcecountry:Nepal OR sourcecountry:Bhutan \
                 OR sourcecountry:Maldives OR sourcecountry:Afghanistan"
            }
            Region::SoutheastAsia => {
                "sourcecountry:Singapore OR sourcecountry:Malaysia OR sourcecountry:Thailand \
                 OR sourcecountry:Vietnam OR sourcecountry:Indonesia OR sourcecountry:Philippines \
                 OR sourcecountry:Myanmar OR sourcecountry:Cambodia OR sourcecountry:Laos \
                 OR sourcecountry:Brunei OR sourcecountry:TimorLeste"
            }
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Region {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .iter()
            .find(|region| region.as_str() == value)
            .copied()
            .ok_or_else(|| format!("unknown region {value:?}"))
    }
}
