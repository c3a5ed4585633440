//! Closed list of service cities (the 81 Turkish provinces).

/// Valid service city names, in province-code order.
pub const SERVICE_CITIES: [&str; 81] = [
    "Adana",
    "Adıyaman",
    "Afyonkarahisar",
    "Ağrı",
    "Amasya",
    "Ankara",
    "Antalya",
    "Artvin",
    "Aydın",
    "Balıkesir",
    "Bilecik",
    "Bingöl",
    "Bitlis",
    "Bolu",
    "Burdur",
    "Bursa",
    "Çanakkale",
    "Çankırı",
    "Çorum",
    "Denizli",
    "Diyarbakır",
    "Edirne",
    "Elazığ",
    "Erzincan",
    "Erzurum",
    "Eskişehir",
    "Gaziantep",
    "Giresun",
    "Gümüşhane",
    "Hakkari",
    "Hatay",
    "Isparta",
    "Mersin",
    "İstanbul",
    "İzmir",
    "Kars",
    "Kastamonu",
    "Kayseri",
    "Kırklareli",
    "Kırşehir",
    "Kocaeli",
    "Konya",
    "Kütahya",
    "Malatya",
    "Manisa",
    "Kahramanmaraş",
    "Mardin",
    "Muğla",
    "Muş",
    "Nevşehir",
    "Niğde",
    "Ordu",
    "Rize",
    "Sakarya",
    "Samsun",
    "Siirt",
    "Sinop",
    "Sivas",
    "Tekirdağ",
    "Tokat",
    "Trabzon",
    "Tunceli",
    "Şanlıurfa",
    "Uşak",
    "Van",
    "Yozgat",
    "Zonguldak",
    "Aksaray",
    "Bayburt",
    "Karaman",
    "Kırıkkale",
    "Batman",
    "Şırnak",
    "Bartın",
    "Ardahan",
    "Iğdır",
    "Yalova",
    "Karabük",
    "Kilis",
    "Osmaniye",
    "Düzce",
];

/// Case-fold a city name. The dotted and dotless forms of I fold together
/// because their case mapping is locale dependent. Circumflexed vowels
/// fold to their plain letters, so "Hakkâri" and "Hakkari" compare equal.
fn fold(name: &str) -> String {
    name.trim()
        .chars()
        .flat_map(|c| match c {
            'I' | 'İ' | 'ı' | 'Î' | 'î' => 'i'.to_lowercase(),
            'Â' | 'â' => 'a'.to_lowercase(),
            'Û' | 'û' => 'u'.to_lowercase(),
            other => other.to_lowercase(),
        })
        .collect()
}

/// Whether `name` case-insensitively matches a known city.
pub fn is_known_city(name: &str) -> bool {
    let folded = fold(name);
    SERVICE_CITIES.iter().any(|city| fold(city) == folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_exact_names() {
        assert!(is_known_city("Ankara"));
        assert!(is_known_city("Şanlıurfa"));
    }

    #[test]
    fn matches_regardless_of_case() {
        assert!(is_known_city("ANKARA"));
        assert!(is_known_city("istanbul"));
        assert!(is_known_city("İSTANBUL"));
        assert!(is_known_city("ISTANBUL"));
        assert!(is_known_city("ızmir"));
    }

    #[test]
    fn circumflex_spellings_match() {
        assert!(is_known_city("Hakkâri"));
        assert!(is_known_city("HAKKÂRİ"));
        assert!(is_known_city("Hakkari"));
        assert!(!is_known_city("Hakkâr"));
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(!is_known_city("Berlin"));
        assert!(!is_known_city(""));
        assert!(!is_known_city("Ankara City"));
    }

    #[test]
    fn list_is_complete_and_unique() {
        let mut folded: Vec<String> = SERVICE_CITIES.iter().map(|c| fold(c)).collect();
        folded.sort();
        folded.dedup();
        assert_eq!(folded.len(), 81);
    }
}
