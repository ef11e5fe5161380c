//! Rate-table injection into the deck hierarchy.
//!
//! Scans the deck set in order for the target `WellControls` element, then
//! rewrites the `TableFunction` it names. First deck containing a complete
//! `WellControls`/`TableFunction` pair wins; the scan stops there. The
//! mutated deck is persisted atomically (temp file + rename in the deck's
//! directory) so the simulator never sees a partial write.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, info};

use crate::deck::InputDeckSet;
use crate::error::{EvalError, EvalResult};
use crate::table::ControlTable;

/// Identifying name of the well control whose rate schedule is optimized.
pub const TARGET_WELL_CONTROL: &str = "wellControls1";

/// `WellControls` attribute naming the rate table to rewrite.
pub const RATE_TABLE_ATTR: &str = "targetTotalRateTableName";

/// Inject `table` into the first deck holding a complete pair; returns the
/// index of the mutated deck within `decks`.
pub fn rewrite(decks: &InputDeckSet, table: &ControlTable) -> EvalResult<usize> {
    for (idx, deck) in decks.iter().enumerate() {
        let xml = fs::read_to_string(deck).map_err(|e| EvalError::io(deck, e))?;

        let Some(table_name) = find_rate_table_name(&xml, deck)? else {
            debug!(deck = %deck.display(), "no target well control in deck");
            continue;
        };

        let Some(rewritten) = rewrite_table_function(&xml, deck, &table_name, table)? else {
            debug!(
                deck = %deck.display(),
                table = %table_name,
                "well control names a table absent from its deck"
            );
            continue;
        };

        persist(deck, &rewritten)?;
        info!(
            deck = %deck.display(),
            table = %table_name,
            "rate table rewritten"
        );
        return Ok(idx);
    }

    Err(EvalError::WellControlNotFound {
        target: TARGET_WELL_CONTROL,
    })
}

/// Value of [`RATE_TABLE_ATTR`] on the first `WellControls` element named
/// [`TARGET_WELL_CONTROL`] that carries it, in document order.
fn find_rate_table_name(xml: &str, deck: &Path) -> EvalResult<Option<String>> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Err(e) => return Err(EvalError::deck_parse(deck, e)),
            Ok(Event::Eof) => return Ok(None),
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() != b"WellControls" {
                    continue;
                }
                let name = attr_value(&e, b"name", deck)?;
                if name.as_deref() != Some(TARGET_WELL_CONTROL) {
                    continue;
                }
                if let Some(table_name) = attr_value(&e, RATE_TABLE_ATTR.as_bytes(), deck)? {
                    return Ok(Some(table_name));
                }
            }
            Ok(_) => {}
        }
    }
}

/// Re-emit the document with the named `TableFunction`'s `coordinates` and
/// `values` attributes replaced. `None` when the table is absent; every
/// other event passes through byte-for-byte.
fn rewrite_table_function(
    xml: &str,
    deck: &Path,
    table_name: &str,
    table: &ControlTable,
) -> EvalResult<Option<Vec<u8>>> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut found = false;

    loop {
        let event = match reader.read_event() {
            Err(e) => return Err(EvalError::deck_parse(deck, e)),
            Ok(Event::Eof) => break,
            Ok(ev) => ev,
        };

        let result = match event {
            Event::Start(e) => {
                if is_named_table(&e, table_name, deck)? {
                    found = true;
                    writer.write_event(Event::Start(with_table_attrs(&e, table, deck)?))
                } else {
                    writer.write_event(Event::Start(e))
                }
            }
            Event::Empty(e) => {
                if is_named_table(&e, table_name, deck)? {
                    found = true;
                    writer.write_event(Event::Empty(with_table_attrs(&e, table, deck)?))
                } else {
                    writer.write_event(Event::Empty(e))
                }
            }
            other => writer.write_event(other),
        };
        result.map_err(|e| EvalError::deck_parse(deck, e))?;
    }

    if found {
        Ok(Some(writer.into_inner().into_inner()))
    } else {
        Ok(None)
    }
}

fn is_named_table(elem: &BytesStart<'_>, table_name: &str, deck: &Path) -> EvalResult<bool> {
    Ok(elem.name().as_ref() == b"TableFunction"
        && attr_value(elem, b"name", deck)?.as_deref() == Some(table_name))
}

/// Copy of `elem` with `coordinates`/`values` set to the computed table.
fn with_table_attrs(
    elem: &BytesStart<'_>,
    table: &ControlTable,
    deck: &Path,
) -> EvalResult<BytesStart<'static>> {
    let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for attr in elem.attributes() {
        let attr = attr.map_err(|e| EvalError::deck_parse(deck, e))?;
        if attr.key.as_ref() == b"coordinates" || attr.key.as_ref() == b"values" {
            continue;
        }
        out.push_attribute(attr);
    }
    out.push_attribute(("coordinates", table.coordinates_attr().as_str()));
    out.push_attribute(("values", table.values_attr().as_str()));
    Ok(out)
}

fn attr_value(elem: &BytesStart<'_>, key: &[u8], deck: &Path) -> EvalResult<Option<String>> {
    for attr in elem.attributes() {
        let attr = attr.map_err(|e| EvalError::deck_parse(deck, e))?;
        if attr.key.as_ref() == key {
            return Ok(Some(String::from_utf8_lossy(&attr.value).into_owned()));
        }
    }
    Ok(None)
}

fn persist(deck: &Path, content: &[u8]) -> EvalResult<()> {
    let dir = deck.parent().unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| EvalError::io(deck, e))?;
    fs::write(tmp.path(), content).map_err(|e| EvalError::io(deck, e))?;
    tmp.persist(deck).map_err(|e| EvalError::io(deck, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck;
    use crate::decision::DecisionVector;
    use std::io::Write;
    use std::path::PathBuf;

    const WELLS_DECK: &str = r#"<?xml version="1.0"?>
<Problem>
  <!-- case controls -->
  <Solvers>
    <WellControls name="wellControls0" type="producer"/>
    <WellControls name="wellControls1" type="injector"
                  targetTotalRateTableName="totalRateTable"/>
  </Solvers>
  <Functions>
    <TableFunction name="otherTable" coordinates="{ 0 }" values="{ 0 }"/>
    <TableFunction name="totalRateTable"
                   inputVarNames="{ time }"
                   coordinates="{ 0, 1 }"
                   values="{ 1, 1 }"/>
  </Functions>
</Problem>
"#;

    fn decision() -> DecisionVector {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"1.0\n100.0\n50.0\n").unwrap();
        DecisionVector::read(f.path()).unwrap()
    }

    fn control_table() -> ControlTable {
        ControlTable::from_decision(&decision())
    }

    fn deck_set(dir: &Path, files: &[(&str, &str)]) -> InputDeckSet {
        for (name, content) in files {
            fs::write(dir.join(name), content).unwrap();
        }
        deck::locate(dir).unwrap()
    }

    fn table_attrs(path: &PathBuf, table_name: &str) -> Option<(String, String)> {
        let xml = fs::read_to_string(path).unwrap();
        let mut reader = Reader::from_str(&xml);
        loop {
            match reader.read_event().unwrap() {
                Event::Eof => return None,
                Event::Start(e) | Event::Empty(e) => {
                    if e.name().as_ref() == b"TableFunction"
                        && attr_value(&e, b"name", path).unwrap().as_deref() == Some(table_name)
                    {
                        let coords = attr_value(&e, b"coordinates", path).unwrap().unwrap();
                        let values = attr_value(&e, b"values", path).unwrap().unwrap();
                        return Some((coords, values));
                    }
                }
                _ => {}
            }
        }
    }

    #[test]
    fn rewrites_the_named_table_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let decks = deck_set(dir.path(), &[("case.xml", WELLS_DECK)]);

        let idx = rewrite(&decks, &control_table()).unwrap();
        assert_eq!(idx, 0);

        let path = dir.path().join("case.xml");
        let (coords, values) = table_attrs(&path, "totalRateTable").unwrap();
        assert_eq!(coords, "{ -100000000000, 0, 31536000, 100000000000 }");
        assert_eq!(values, "{ 0, 100, 50, 50 }");

        // untouched siblings keep their attributes
        let (other_coords, _) = table_attrs(&path, "otherTable").unwrap();
        assert_eq!(other_coords, "{ 0 }");
    }

    #[test]
    fn first_deck_with_a_complete_pair_wins() {
        let dir = tempfile::tempdir().unwrap();
        let root = r#"<Problem>
  <File name="wells_a.xml"/>
  <File name="wells_b.xml"/>
</Problem>"#;
        let decks = deck_set(
            dir.path(),
            &[
                ("case.xml", root),
                ("wells_a.xml", WELLS_DECK),
                ("wells_b.xml", WELLS_DECK),
            ],
        );
        assert_eq!(decks.root(), dir.path().join("case.xml"));

        let idx = rewrite(&decks, &control_table()).unwrap();
        assert_eq!(idx, 1);

        // the second include is left byte-identical
        let untouched = fs::read_to_string(dir.path().join("wells_b.xml")).unwrap();
        assert_eq!(untouched, WELLS_DECK);
    }

    #[test]
    fn well_control_without_table_attr_keeps_scanning() {
        let dir = tempfile::tempdir().unwrap();
        let bare = r#"<Problem>
  <File name="wells.xml"/>
  <WellControls name="wellControls1" type="injector"/>
</Problem>"#;
        let decks = deck_set(dir.path(), &[("case.xml", bare), ("wells.xml", WELLS_DECK)]);

        let idx = rewrite(&decks, &control_table()).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn missing_pair_is_well_control_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let decks = deck_set(dir.path(), &[("case.xml", "<Problem/>")]);
        assert!(matches!(
            rewrite(&decks, &control_table()),
            Err(EvalError::WellControlNotFound { .. })
        ));
    }

    #[test]
    fn named_table_missing_from_same_deck_is_not_a_match() {
        let dir = tempfile::tempdir().unwrap();
        let dangling = r#"<Problem>
  <WellControls name="wellControls1" targetTotalRateTableName="absentTable"/>
  <TableFunction name="otherTable" coordinates="{ 0 }" values="{ 0 }"/>
</Problem>"#;
        let decks = deck_set(dir.path(), &[("case.xml", dangling)]);
        assert!(matches!(
            rewrite(&decks, &control_table()),
            Err(EvalError::WellControlNotFound { .. })
        ));
    }

    #[test]
    fn rewrite_is_idempotent_on_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let decks = deck_set(dir.path(), &[("case.xml", WELLS_DECK)]);
        let table = control_table();

        rewrite(&decks, &table).unwrap();
        let once = fs::read(dir.path().join("case.xml")).unwrap();

        rewrite(&decks, &table).unwrap();
        let twice = fs::read(dir.path().join("case.xml")).unwrap();

        assert_eq!(once, twice);
    }
}
