use std::collections::BTreeMap;
use std::io::Read;

/// One CSV row as a header-to-value map; unheadered trailing cells are
/// dropped by the csv reader before we get here.
pub(crate) type Row = BTreeMap<String, String>;

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<(Vec<String>, Vec<Row>), csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|header| header.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();
        rows.push(row);
    }

    Ok((headers, rows))
}
