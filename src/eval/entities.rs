// ============================================================
// Entity chunk extraction
// ============================================================
// Turns a tag sequence into entity spans, following seqeval's
// default (non-strict) rules so scores match the numbers
// seqeval reports.
//
// A tag is `<prefix>-<TYPE>` or `O`. Supported prefixes:
//   B (begin), I (inside), E (end), S (single), O (outside).
// IOB1 data like WikiGold uses I everywhere and B only between
// two adjacent entities of the same type; IOB2/IOE/IOBES data
// is handled by the same rules.
//
// Example:
//   I-PER I-PER O I-LOC B-LOC
//   → (PER, 0, 1), (LOC, 3, 3), (LOC, 4, 4)

/// An entity span, `start..=end` over word positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    pub kind:  String,
    pub start: usize,
    pub end:   usize,
}

fn split_tag(tag: &str) -> (char, &str) {
    let prefix = tag.chars().next().unwrap_or('O');
    let rest   = tag.get(prefix.len_utf8()..).unwrap_or("");
    let kind   = match rest.split_once('-') {
        Some((_, kind)) => kind,
        None            => rest,
    };
    (prefix, if kind.is_empty() { "_" } else { kind })
}

fn end_of_chunk(prev_tag: char, tag: char, prev_kind: &str, kind: &str) -> bool {
    matches!(
        (prev_tag, tag),
        ('E', _) | ('S', _) | ('B', 'B') | ('B', 'S') | ('B', 'O') | ('I', 'B') | ('I', 'S') | ('I', 'O')
    ) || (prev_tag != 'O' && prev_tag != '.' && prev_kind != kind)
}

fn start_of_chunk(prev_tag: char, tag: char, prev_kind: &str, kind: &str) -> bool {
    matches!(
        (prev_tag, tag),
        (_, 'B') | (_, 'S') | ('E', 'E') | ('E', 'I') | ('S', 'E') | ('S', 'I') | ('O', 'E') | ('O', 'I')
    ) || (tag != 'O' && tag != '.' && prev_kind != kind)
}

/// Extract entities from one tag sequence.
pub fn get_entities<S: AsRef<str>>(seq: &[S]) -> Vec<Entity> {
    let mut chunks    = Vec::new();
    let mut prev_tag  = 'O';
    let mut prev_kind = "";
    let mut begin     = 0usize;

    let tags = seq.iter().map(AsRef::as_ref).chain(std::iter::once("O"));
    for (i, t) in tags.enumerate() {
        let (tag, kind) = split_tag(t);

        if end_of_chunk(prev_tag, tag, prev_kind, kind) {
            chunks.push(Entity { kind: prev_kind.to_string(), start: begin, end: i - 1 });
        }
        if start_of_chunk(prev_tag, tag, prev_kind, kind) {
            begin = i;
        }
        prev_tag  = tag;
        prev_kind = kind;
    }
    chunks
}

/// Extract entities from several sentences. Offsets are global:
/// sentences are laid end to end with an `O` between them, so an
/// entity never spans two sentences.
pub fn get_entities_nested<S: AsRef<str>>(seqs: &[Vec<S>]) -> Vec<Entity> {
    let mut flat: Vec<&str> = Vec::new();
    for seq in seqs {
        flat.extend(seq.iter().map(AsRef::as_ref));
        flat.push("O");
    }
    get_entities(&flat)
}
