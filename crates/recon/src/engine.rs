use std::collections::{HashMap, HashSet};

use crate::config::RosterConfig;
use crate::error::ReconError;
use crate::model::{
    Incident, ReconOutput, Resolution, Roster, RosterEntry, SessionRecord, UnresolvedEntry,
};
use crate::normalize::canonical_key;

/// Callback used in interactive mode to correct, ignore, or abort on a
/// check-in key with no roster match.
pub type Resolver<'a> = &'a mut dyn FnMut(&str) -> Resolution;

/// Reconcile check-ins against the roster.
///
/// Sessions are processed in input order, and each session's identifiers in
/// input order. With `resolver == None` every miss is recorded as
/// unresolved and the run continues; with a resolver the operator is asked
/// per miss and may correct the key, ignore it for the rest of the run, or
/// abort, which discards all output.
pub fn reconcile(
    roster: &Roster,
    sessions: &[SessionRecord],
    mut resolver: Option<Resolver<'_>>,
) -> Result<ReconOutput, ReconError> {
    // Multiplicity per identifier. Anything above one is a roster
    // integrity violation, surfaced per occurrence.
    let mut matches: HashMap<&str, u32> = HashMap::new();
    for entry in &roster.entries {
        *matches.entry(entry.identifier.as_str()).or_insert(0) += 1;
    }

    let mut out = ReconOutput::default();
    let mut remap: HashMap<String, String> = HashMap::new();
    let mut ignored: HashSet<String> = HashSet::new();

    for session in sessions {
        if out.first_session_date.is_none() {
            out.first_session_date = Some(session.date);
        }
        out.last_session_date = Some(session.date);
        out.session_dates.push(session.date);

        for raw in &session.raw_identifiers {
            let mut key = canonical_key(raw);
            if ignored.contains(&key) {
                continue;
            }
            if let Some(mapped) = remap.get(&key) {
                key = mapped.clone();
            }

            match matches.get(key.as_str()).copied().unwrap_or(0) {
                1 => out.matrix.mark(&key, session.date),
                0 => {
                    // The miss is recorded before the operator is asked; a
                    // later correction does not retract it.
                    out.unresolved.push(UnresolvedEntry {
                        raw_identifier: key.clone(),
                        date: session.date,
                    });

                    let Some(resolve) = resolver.as_mut() else {
                        continue;
                    };
                    match resolve(&key) {
                        Resolution::Ignore => {
                            ignored.insert(key);
                        }
                        Resolution::Abort => {
                            return Err(ReconError::Aborted { key });
                        }
                        Resolution::Corrected(corrected) => {
                            remap.insert(key.clone(), corrected.clone());
                            match matches.get(corrected.as_str()).copied().unwrap_or(0) {
                                1 => out.matrix.mark(&corrected, session.date),
                                0 => out.incidents.push(Incident::CorrectionMiss {
                                    original: key,
                                    corrected,
                                    date: session.date,
                                }),
                                _ => out.incidents.push(Incident::DuplicateIdentifier {
                                    key: corrected,
                                    date: session.date,
                                }),
                            }
                        }
                    }
                }
                _ => out.incidents.push(Incident::DuplicateIdentifier {
                    key,
                    date: session.date,
                }),
            }
        }
    }

    Ok(out)
}

/// Parse roster CSV text into a `Roster`, applying the configured column
/// names, identifier selection, and dropped columns. Rows with an empty
/// identifier field are skipped.
pub fn load_roster(csv_data: &str, config: &RosterConfig) -> Result<Roster, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(config.has_headers)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let columns: Vec<String> = if config.has_headers {
        reader
            .headers()
            .map_err(|e| ReconError::Csv(e.to_string()))?
            .iter()
            .map(unquote)
            .collect()
    } else {
        config.columns.clone()
    };

    let identifier_idx = columns
        .iter()
        .position(|c| c == &config.identifier)
        .ok_or_else(|| ReconError::MissingColumn {
            column: config.identifier.clone(),
        })?;

    for dropped in &config.drop {
        if !columns.contains(dropped) {
            return Err(ReconError::MissingColumn {
                column: dropped.clone(),
            });
        }
    }

    let kept: Vec<usize> = (0..columns.len())
        .filter(|&i| i != identifier_idx && !config.drop.contains(&columns[i]))
        .collect();
    let attribute_names: Vec<String> = kept.iter().map(|&i| columns[i].clone()).collect();

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Csv(e.to_string()))?;
        let identifier = unquote(record.get(identifier_idx).unwrap_or(""));
        if identifier.is_empty() {
            continue;
        }
        let attributes = kept
            .iter()
            .map(|&i| unquote(record.get(i).unwrap_or("")))
            .collect();
        entries.push(RosterEntry {
            identifier,
            attributes,
        });
    }

    Ok(Roster {
        identifier_name: config.identifier.clone(),
        attribute_names,
        entries,
    })
}

/// Group exports sometimes pad the separator before a quoted field, which
/// leaves literal quotes on the parsed value.
fn unquote(field: &str) -> String {
    field.trim().trim_matches('"').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn roster(ids: &[&str]) -> Roster {
        Roster {
            identifier_name: "username".into(),
            attribute_names: vec!["first_name".into()],
            entries: ids
                .iter()
                .map(|id| RosterEntry {
                    identifier: (*id).into(),
                    attributes: vec![format!("{id}-name")],
                })
                .collect(),
        }
    }

    fn session(date: &str, raws: &[&str]) -> SessionRecord {
        SessionRecord {
            date: d(date),
            raw_identifiers: raws.iter().map(|r| (*r).into()).collect(),
        }
    }

    #[test]
    fn normalized_matches_fill_the_matrix() {
        let roster = roster(&["ann", "bob"]);
        let sessions = vec![
            session("2025-09-01", &["ann@x.com"]),
            session("2025-09-08", &["ANN ", "carol"]),
        ];

        let out = reconcile(&roster, &sessions, None).unwrap();
        assert_eq!(out.matrix.times_present("ann"), 2);
        assert_eq!(out.matrix.times_present("bob"), 0);
        assert_eq!(
            out.unresolved,
            vec![UnresolvedEntry {
                raw_identifier: "carol".into(),
                date: d("2025-09-08"),
            }]
        );
        assert_eq!(out.first_session_date, Some(d("2025-09-01")));
        assert_eq!(out.last_session_date, Some(d("2025-09-08")));
        assert!(out.incidents.is_empty());
    }

    #[test]
    fn disjoint_inputs_leave_matrix_empty() {
        let roster = roster(&["ann", "bob"]);
        let sessions = vec![session("2025-09-01", &["carol", "dave"])];

        let out = reconcile(&roster, &sessions, None).unwrap();
        assert!(out.matrix.is_empty());
        assert_eq!(out.unresolved.len(), 2);
    }

    #[test]
    fn correction_marks_the_corrected_entry() {
        let roster = roster(&["ann", "bob"]);
        let sessions = vec![
            session("2025-09-01", &["ann@x.com"]),
            session("2025-09-08", &["ANN ", "carol"]),
        ];

        let mut resolve = |key: &str| {
            assert_eq!(key, "carol");
            Resolution::Corrected("bob".into())
        };
        let out = reconcile(&roster, &sessions, Some(&mut resolve)).unwrap();

        assert_eq!(out.matrix.times_present("bob"), 1);
        assert!(out.matrix.is_present("bob", d("2025-09-08")));
        // The miss itself stays recorded.
        assert_eq!(out.unresolved.len(), 1);
        assert_eq!(out.unresolved[0].raw_identifier, "carol");
        assert!(out.incidents.is_empty());
    }

    #[test]
    fn remap_applies_without_reprompting() {
        let roster = roster(&["bob"]);
        let sessions = vec![
            session("2025-09-01", &["karol"]),
            session("2025-09-08", &["Karol @x.com"]),
        ];

        let mut prompts = 0;
        let mut resolve = |_key: &str| {
            prompts += 1;
            Resolution::Corrected("bob".into())
        };
        let out = reconcile(&roster, &sessions, Some(&mut resolve)).unwrap();

        assert_eq!(prompts, 1);
        assert_eq!(out.matrix.times_present("bob"), 2);
        assert_eq!(out.unresolved.len(), 1);
    }

    #[test]
    fn ignore_is_sticky_across_sessions() {
        let roster = roster(&["ann"]);
        let sessions = vec![
            session("2025-09-01", &["ghost"]),
            session("2025-09-08", &["ghost", "ghost"]),
        ];

        let mut prompts = 0;
        let mut resolve = |_key: &str| {
            prompts += 1;
            Resolution::Ignore
        };
        let out = reconcile(&roster, &sessions, Some(&mut resolve)).unwrap();

        assert_eq!(prompts, 1);
        assert_eq!(out.unresolved.len(), 1);
        assert!(out.matrix.is_empty());
    }

    #[test]
    fn abort_is_fatal() {
        let roster = roster(&["ann"]);
        let sessions = vec![session("2025-09-01", &["ghost"])];

        let mut resolve = |_key: &str| Resolution::Abort;
        let err = reconcile(&roster, &sessions, Some(&mut resolve)).unwrap_err();
        assert!(matches!(err, ReconError::Aborted { key } if key == "ghost"));
    }

    #[test]
    fn duplicate_roster_identifier_is_an_incident() {
        let roster = roster(&["ann", "ann"]);
        let sessions = vec![session("2025-09-01", &["ann"])];

        let out = reconcile(&roster, &sessions, None).unwrap();
        assert!(out.matrix.is_empty());
        assert!(out.unresolved.is_empty());
        assert_eq!(
            out.incidents,
            vec![Incident::DuplicateIdentifier {
                key: "ann".into(),
                date: d("2025-09-01"),
            }]
        );
    }

    #[test]
    fn failed_correction_is_an_incident_and_the_miss_stands() {
        let roster = roster(&["ann"]);
        let sessions = vec![session("2025-09-01", &["boo"])];

        let mut resolve = |_key: &str| Resolution::Corrected("zed".into());
        let out = reconcile(&roster, &sessions, Some(&mut resolve)).unwrap();

        assert!(out.matrix.is_empty());
        assert_eq!(out.unresolved.len(), 1);
        assert_eq!(
            out.incidents,
            vec![Incident::CorrectionMiss {
                original: "boo".into(),
                corrected: "zed".into(),
                date: d("2025-09-01"),
            }]
        );
    }

    #[test]
    fn failed_correction_substitutes_on_later_occurrences() {
        let roster = roster(&["ann"]);
        let sessions = vec![
            session("2025-09-01", &["boo"]),
            session("2025-09-08", &["boo"]),
        ];

        // First prompt corrects "boo" to the off-roster "zed"; the second
        // session's "boo" is substituted to "zed" and prompts again.
        let mut prompted: Vec<String> = Vec::new();
        let mut resolve = |key: &str| {
            prompted.push(key.to_string());
            match key {
                "boo" => Resolution::Corrected("zed".into()),
                _ => Resolution::Ignore,
            }
        };
        let out = reconcile(&roster, &sessions, Some(&mut resolve)).unwrap();

        assert_eq!(prompted, vec!["boo".to_string(), "zed".to_string()]);
        assert_eq!(out.unresolved.len(), 2);
        assert_eq!(out.unresolved[1].raw_identifier, "zed");
    }

    #[test]
    fn first_and_last_dates_follow_input_order() {
        let roster = roster(&["ann"]);
        let sessions = vec![
            session("2025-03-10", &["ann"]),
            session("2025-01-05", &["ann"]),
        ];

        let out = reconcile(&roster, &sessions, None).unwrap();
        assert_eq!(out.first_session_date, Some(d("2025-03-10")));
        assert_eq!(out.last_session_date, Some(d("2025-01-05")));
        assert_eq!(out.session_dates, vec![d("2025-03-10"), d("2025-01-05")]);
    }

    #[test]
    fn no_sessions_means_no_dates() {
        let out = reconcile(&roster(&["ann"]), &[], None).unwrap();
        assert!(out.first_session_date.is_none());
        assert!(out.last_session_date.is_none());
        assert!(out.matrix.is_empty());
    }

    // -- load_roster ---------------------------------------------------------

    fn roster_config() -> RosterConfig {
        RosterConfig {
            file: "groups.csv".into(),
            columns: vec![
                "class".into(),
                "username".into(),
                "number".into(),
                "first_name".into(),
                "last_name".into(),
            ],
            identifier: "username".into(),
            has_headers: false,
            drop: vec!["number".into()],
        }
    }

    #[test]
    fn load_roster_headerless() {
        let csv = "\
\"1FA\", \"ann\", \"1\", \"Ann\", \"Archer\"
\"1FA\", \"bob\", \"2\", \"Bob\", \"Banner\"
";
        let roster = load_roster(csv, &roster_config()).unwrap();
        assert_eq!(
            roster.attribute_names,
            vec!["class", "first_name", "last_name"]
        );
        assert_eq!(roster.entries.len(), 2);
        assert_eq!(roster.entries[0].identifier, "ann");
        assert_eq!(roster.entries[0].attributes, vec!["1FA", "Ann", "Archer"]);
        assert_eq!(roster.entries[1].identifier, "bob");
    }

    #[test]
    fn load_roster_with_header_row() {
        let csv = "\
class,username,first_name
1FA,ann,Ann
";
        let config = RosterConfig {
            file: "groups.csv".into(),
            columns: Vec::new(),
            identifier: "username".into(),
            has_headers: true,
            drop: Vec::new(),
        };
        let roster = load_roster(csv, &config).unwrap();
        assert_eq!(roster.attribute_names, vec!["class", "first_name"]);
        assert_eq!(roster.entries[0].identifier, "ann");
    }

    #[test]
    fn load_roster_missing_identifier_column() {
        let csv = "class,first_name\n1FA,Ann\n";
        let config = RosterConfig {
            file: "groups.csv".into(),
            columns: Vec::new(),
            identifier: "username".into(),
            has_headers: true,
            drop: Vec::new(),
        };
        let err = load_roster(csv, &config).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { column } if column == "username"));
    }

    #[test]
    fn load_roster_skips_rows_without_identifier() {
        let csv = "\
\"1FA\", \"ann\", \"1\", \"Ann\", \"Archer\"
\"1FA\", \"\", \"3\", \"Ghost\", \"Row\"
";
        let roster = load_roster(csv, &roster_config()).unwrap();
        assert_eq!(roster.entries.len(), 1);
    }
}
