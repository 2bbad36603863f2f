use std::io::{BufRead, Write};
use std::sync::Arc;

use log::debug;

use crate::error::{CoocError, Result};
use crate::table::{CoocTable, Partner, PartnerKey};

// both layouts share the line shape
// <item>:<count>\t<partner>:<count>:<weight> <partner>:<count>:<weight> ...
// and differ only in whether <partner> is a literal item or an entry id

/// Parse an item-keyed table. Once the whole input is read, every
/// partner string is resolved to an entry id; a partner that never had a
/// main line of its own gets an entry synthesized for it, carrying the
/// joint count of the single edge that revealed it (not a corpus-wide
/// count).
pub fn load_item_keyed<R: BufRead>(reader: R) -> Result<CoocTable> {
    let mut table = CoocTable::new(1);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        let head = match tokens.next() {
            Some(head) => head,
            None => continue,
        };
        let (item, count) = match parse_main(head, lineno + 1)? {
            Some(main) => main,
            None => {
                debug!("line {}: no count separator in {:?}, line skipped", lineno + 1, head);
                continue;
            }
        };
        let mut partners = Vec::new();
        for token in tokens {
            match parse_item_partner(token) {
                Some(partner) => partners.push(partner),
                None => debug!("line {}: partner token {:?} skipped", lineno + 1, token),
            }
        }
        table.insert_entry(item, count, partners)?;
    }
    resolve_items(&mut table);
    Ok(table)
}

/// Parse an id-keyed table. Partner ids are taken verbatim while
/// reading; only after the whole input is read are they checked and
/// swapped for the item strings they reference. An id of 0 or past the
/// table end is fatal.
pub fn load_id_keyed<R: BufRead>(reader: R) -> Result<CoocTable> {
    let mut table = CoocTable::new(1);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        let head = match tokens.next() {
            Some(head) => head,
            None => continue,
        };
        let (item, count) = match parse_main(head, lineno + 1)? {
            Some(main) => main,
            None => {
                debug!("line {}: no count separator in {:?}, line skipped", lineno + 1, head);
                continue;
            }
        };
        let mut partners = Vec::new();
        for token in tokens {
            match parse_id_partner(token) {
                Some(partner) => partners.push(partner),
                None => debug!("line {}: partner token {:?} skipped", lineno + 1, token),
            }
        }
        table.insert_entry(item, count, partners)?;
    }
    resolve_ids(&mut table)?;
    Ok(table)
}

/// Write the table item-keyed, skipping the header range. Partner lists
/// must already be resolved to item references.
pub fn dump_item_keyed<W: Write>(table: &CoocTable, writer: &mut W) -> Result<()> {
    for entry in table.entries().iter().skip(table.start_id() as usize) {
        write!(writer, "{}:{}\t", entry.item, entry.count)?;
        for partner in &entry.partners {
            match &partner.key {
                PartnerKey::Item(item) => {
                    write!(writer, "{}:{}:{} ", item, partner.count, partner.weight)?
                }
                PartnerKey::Id(_) => return Err(CoocError::Unresolved { id: entry.id }),
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Write the table id-keyed, skipping the header range. Partner lists
/// must already be resolved to id references.
pub fn dump_id_keyed<W: Write>(table: &CoocTable, writer: &mut W) -> Result<()> {
    for entry in table.entries().iter().skip(table.start_id() as usize) {
        write!(writer, "{}:{}\t", entry.item, entry.count)?;
        for partner in &entry.partners {
            match &partner.key {
                PartnerKey::Id(id) => {
                    write!(writer, "{}:{}:{} ", id, partner.count, partner.weight)?
                }
                PartnerKey::Item(_) => return Err(CoocError::Unresolved { id: entry.id }),
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

// the count separator is the first `:` of the main token. a missing
// separator, an empty item or an empty count skips the line; a count
// that is present but not numeric aborts the load, an entry with an
// unparseable identity is never constructed
fn parse_main(token: &str, lineno: usize) -> Result<Option<(&str, u64)>> {
    let (item, count) = match token.split_once(':') {
        Some(split) => split,
        None => return Ok(None),
    };
    if item.is_empty() || count.is_empty() {
        return Ok(None);
    }
    match count.parse::<u64>() {
        Ok(count) => Ok(Some((item, count))),
        Err(_) => Err(CoocError::BadMainEntry {
            line: lineno,
            token: token.to_string(),
        }),
    }
}

// item:count:weight with the two separators taken from the end, so
// partner items containing `:` still parse; any malformed sub-field
// drops the token
fn parse_item_partner(token: &str) -> Option<Partner> {
    let (rest, weight) = token.rsplit_once(':')?;
    let (item, count) = rest.rsplit_once(':')?;
    if item.is_empty() {
        return None;
    }
    let count = count.parse::<u64>().ok()?;
    let weight = weight.parse::<f64>().ok()?;
    Some(Partner {
        key: PartnerKey::Item(Arc::from(item)),
        count,
        weight,
    })
}

// id:count:weight, exactly three numeric fields
fn parse_id_partner(token: &str) -> Option<Partner> {
    let mut fields = token.split(':');
    let id = fields.next()?.parse::<u32>().ok()?;
    let count = fields.next()?.parse::<u64>().ok()?;
    let weight = fields.next()?.parse::<f64>().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(Partner {
        key: PartnerKey::Id(id),
        count,
        weight,
    })
}

// second pass of the item-keyed load, over the entries that were read
// (synthesized entries are appended past `known` and carry no partners)
fn resolve_items(table: &mut CoocTable) {
    let known = table.len();
    for index in table.start_id() as usize..known {
        let mut partners = match table.entry_mut(index as u32) {
            Some(entry) => std::mem::take(&mut entry.partners),
            None => continue,
        };
        for partner in &mut partners {
            let id = match &partner.key {
                PartnerKey::Item(item) => table.get_or_intern(item, partner.count),
                PartnerKey::Id(id) => *id,
            };
            partner.key = PartnerKey::Id(id);
        }
        if let Some(entry) = table.entry_mut(index as u32) {
            entry.partners = partners;
        }
    }
}

// second pass of the id-keyed load; the target entry's item handle is
// shared, not copied
fn resolve_ids(table: &mut CoocTable) -> Result<()> {
    let size = table.len();
    for index in table.start_id() as usize..size {
        let mut partners = match table.entry_mut(index as u32) {
            Some(entry) => std::mem::take(&mut entry.partners),
            None => continue,
        };
        for partner in &mut partners {
            let id = match &partner.key {
                PartnerKey::Id(id) => *id,
                PartnerKey::Item(_) => continue,
            };
            if id < table.start_id() || id as usize >= size {
                return Err(CoocError::BadPartnerRef { id, size });
            }
            let item = match table.item_of(id) {
                Some(item) => item.clone(),
                None => return Err(CoocError::BadPartnerRef { id, size }),
            };
            partner.key = PartnerKey::Item(item);
        }
        if let Some(entry) = table.entry_mut(index as u32) {
            entry.partners = partners;
        }
    }
    Ok(())
}
