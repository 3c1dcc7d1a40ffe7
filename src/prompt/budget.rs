use crate::prompt::segments::{OptionalClass, Segment};

pub const ELLIPSIS: char = '…';

pub fn joined_len(segments: &[Segment]) -> usize {
    let text: usize = segments.iter().map(|segment| segment.text.chars().count()).sum();
    text + segments.len().saturating_sub(1)
}

pub fn join(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn prune_to_budget(mut segments: Vec<Segment>, budget: usize) -> Vec<Segment> {
    if joined_len(&segments) <= budget {
        return segments;
    }

    let mut index = segments.len();
    while index > 0 {
        index -= 1;
        if !segments[index].optional_class.is_prunable() {
            continue;
        }
        let removed = segments.remove(index);
        tracing::debug!(
            target: "prompt.engine",
            build_order = removed.build_order,
            class = ?removed.optional_class,
            "Dropped optional segment to fit budget"
        );
        if joined_len(&segments) <= budget {
            return segments;
        }
    }

    let joined = join(&segments);
    let mut truncated: String = joined.chars().take(budget.saturating_sub(1)).collect();
    truncated.push(ELLIPSIS);
    tracing::debug!(
        target: "prompt.engine",
        budget,
        draft_len = joined.chars().count(),
        "Hard-capped prompt"
    );

    vec![Segment {
        build_order: 0,
        optional_class: OptionalClass::None,
        text: truncated,
    }]
}
