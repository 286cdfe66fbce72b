use std::collections::VecDeque;

use dingo_sourcemap::{Mapping, Position, SourceMap};

/// Families of marker comment the preprocessor leaves behind, keyed by
/// the same `name` it tags its own `SourceMap` entries with (see
/// `dingo-preprocessor`'s `enums`/`rust_match`/`error_propagation`
/// passes). Recognizing a start marker's family tells us which queue
/// of `running` entries to pull the next Dingo position from.
fn family_of(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("// DINGO_GENERATED:START") {
        Some("enum")
    } else if trimmed.starts_with("// DINGO_MATCH_START:") {
        Some("match")
    } else if trimmed.starts_with("// dingo:s:") {
        Some("error_prop")
    } else {
        None
    }
}

fn is_end_marker(line: &str, family: &str) -> bool {
    let trimmed = line.trim_start();
    match family {
        "enum" => trimmed.starts_with("// DINGO_GENERATED:END"),
        "match" => trimmed.starts_with("// DINGO_MATCH_END"),
        "error_prop" => trimmed.starts_with("// dingo:e:"),
        _ => false,
    }
}

/// Rebuilds the Dingo-to-Go portion of the source map by re-scanning
/// the printer's output for marker comment pairs and zipping them, in
/// encounter order, against `running`'s entries of the same name. The
/// printer re-flows whitespace and line numbers, so this is the only
/// point at which the *final* generated coordinates are known; `running`
/// supplies the original Dingo coordinates those markers correspond to.
pub fn compose_final_map(go_source: &str, running: &SourceMap, go_file: &str) -> SourceMap {
    let mut queues: std::collections::HashMap<&str, VecDeque<&Mapping>> = std::collections::HashMap::new();
    for m in running.mappings() {
        if let Some(name) = m.name.as_deref() {
            queues.entry(name).or_default().push_back(m);
        }
    }

    let mut result = SourceMap::new(running.source_file.clone(), go_file);
    let mut open: Option<&'static str> = None;
    let mut region_start: Option<Position> = None;

    for (idx, line) in go_source.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        if let Some(family) = open {
            if is_end_marker(line, family) {
                if let (Some(start), Some(queue)) = (region_start, queues.get_mut(family)) {
                    if let Some(source_entry) = queue.pop_front() {
                        let length = line_no.saturating_sub(start.line).max(1);
                        let mapping = Mapping::new(source_entry.dingo, start, length).with_name(family);
                        // Duplicate generated positions only happen when two
                        // regions start on the exact same line, which the
                        // preprocessor never produces; skip defensively rather
                        // than panic if it ever does.
                        let _ = result.add(mapping);
                    }
                }
                open = None;
                region_start = None;
                continue;
            }
        } else if let Some(family) = family_of(line) {
            let col = (line.len() - line.trim_start().len() + 1) as u32;
            open = Some(family);
            region_start = Some(Position::new(line_no, col));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zips_match_markers_with_the_running_maps_match_entries() {
        let mut running = SourceMap::new("f.dingo", "f.mid");
        running
            .add(Mapping::new(Position::new(5, 2), Position::new(1, 1), 3).with_name("match"))
            .unwrap();

        let go = "package p\n\n// DINGO_MATCH_START: r\n__match1 := r\nswitch {\n}\n// DINGO_MATCH_END\n";
        let final_map = compose_final_map(go, &running, "f.go");
        assert_eq!(final_map.len(), 1);
        let entry = &final_map.mappings()[0];
        assert_eq!(entry.dingo, Position::new(5, 2));
        assert_eq!(entry.go, Position::new(3, 1));
        assert_eq!(entry.name.as_deref(), Some("match"));
    }

    #[test]
    fn ignores_unmatched_output_with_no_markers() {
        let running = SourceMap::new("f.dingo", "f.mid");
        let go = "package p\n\nfunc F() {}\n";
        let final_map = compose_final_map(go, &running, "f.go");
        assert!(final_map.is_empty());
    }
}
