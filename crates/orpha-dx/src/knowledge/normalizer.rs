/// Canonical form of a vocabulary term or disorder label: invisible
/// characters stripped, runs of whitespace collapsed. Case is preserved since
/// HPO labels are matched exactly.
pub(crate) fn normalize_term(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}', '\u{a0}'], " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
