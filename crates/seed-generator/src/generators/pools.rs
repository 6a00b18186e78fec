//! Value pools for synthetic users and addresses.

pub const FIRST_NAMES: &[&str] = &[
    "Aaliyah", "Adrian", "Aiko", "Alejandro", "Amara", "Anders", "Beatriz", "Benedikt", "Bianca",
    "Carlos", "Chiara", "Cyrus", "Dalia", "Daniel", "Elif", "Emeka", "Esther", "Farah", "Felix",
    "Gabriel", "Greta", "Hana", "Hugo", "Ines", "Ivan", "Jamal", "Jonas", "Keiko", "Lars", "Leila",
    "Lucas", "Mai", "Marco", "Maya", "Nadia", "Noah", "Olga", "Omar", "Priya", "Rafael", "Rosa",
    "Samir", "Sofia", "Tariq", "Uma", "Viktor", "Wen", "Yara", "Yusuf", "Zoe",
];

pub const LAST_NAMES: &[&str] = &[
    "Abbott", "Akintola", "Andersson", "Bauer", "Bianchi", "Castillo", "Chen", "Costa", "Dubois",
    "Eriksen", "Fischer", "Garcia", "Hansen", "Haddad", "Ivanova", "Jensen", "Kaur", "Kim",
    "Kowalski", "Larsen", "Lopez", "Moreau", "Murphy", "Nakamura", "Novak", "Okafor", "Olsen",
    "Patel", "Petrov", "Quinn", "Rossi", "Santos", "Schmidt", "Silva", "Tanaka", "Torres",
    "Varga", "Wagner", "Walsh", "Yilmaz",
];

pub const CITIES: &[&str] = &[
    "Amsterdam", "Auckland", "Barcelona", "Berlin", "Bogota", "Cairo", "Chicago", "Dublin",
    "Helsinki", "Istanbul", "Kyoto", "Lagos", "Lima", "Lisbon", "Melbourne", "Montreal", "Nairobi",
    "Oslo", "Prague", "Seoul", "Toronto", "Valencia", "Vienna", "Warsaw",
];

pub const COUNTRIES: &[&str] = &[
    "Argentina", "Australia", "Austria", "Brazil", "Canada", "Colombia", "Czechia", "Egypt",
    "Finland", "France", "Germany", "Ireland", "Italy", "Japan", "Kenya", "Netherlands",
    "New Zealand", "Nigeria", "Norway", "Peru", "Poland", "Portugal", "South Korea", "Spain",
    "Turkey", "United Kingdom", "United States",
];

pub const STREET_NAMES: &[&str] = &[
    "Ash", "Birch", "Cedar", "Chestnut", "Elm", "Hawthorn", "Hill", "Lake", "Linden", "Maple",
    "Meadow", "Mill", "Oak", "Park", "Pine", "River", "Station", "Sunset", "Willow",
];

pub const STREET_SUFFIXES: &[&str] = &[
    "Avenue", "Boulevard", "Close", "Court", "Drive", "Lane", "Road", "Row", "Street", "Way",
];

pub const EMAIL_DOMAINS: &[&str] = &["example.com", "example.net", "example.org"];
