use crate::types::TokenMetadata;

const FIELD_SEPARATOR: char = '-';
const MIN_FIELDS: usize = 9;

/// Splits an interval label such as `s-casa-a-s-a-t-final-x-f-30` into
/// token metadata. The eighth field is unused; the age field is optional.
pub fn parse_label(label: &str) -> Option<TokenMetadata> {
    let fields: Vec<&str> = label.split(FIELD_SEPARATOR).collect();
    if fields.len() < MIN_FIELDS {
        return None;
    }
    Some(TokenMetadata {
        phoneme: fields[0].to_string(),
        word: fields[1].to_string(),
        previous: fields[2].to_string(),
        target: fields[3].to_string(),
        following: fields[4].to_string(),
        tonicity: fields[5].to_string(),
        position: fields[6].to_string(),
        sex: fields[8].to_string(),
        age: fields.get(9).map(|age| age.to_string()).unwrap_or_default(),
    })
}
