//! Rule set parsing.
//!
//! A rule is one pipe-delimited configuration line mapping a group name to up
//! to four trust-level titles: `group|tl1Title|tl2Title|tl3Title|tl4Title`.
//! Fields are trimmed after splitting; trailing title fields are optional.

/// One configured mapping from a group name to per-trust-level titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    group: String,
    titles: Vec<String>,
}

impl Rule {
    /// Parse a single rule line. Returns `None` for lines that are blank
    /// after trimming.
    ///
    /// A line with a group name but no title fields still parses into a rule:
    /// it takes part in first-match selection and then never yields a title,
    /// so it shadows later rules for the same group rather than being dropped.
    pub fn parse(line: &str) -> Option<Rule> {
        if line.trim().is_empty() {
            return None;
        }
        let mut fields = line.split('|').map(str::trim);
        let group = fields.next().unwrap_or_default().to_string();
        let titles = fields.map(str::to_string).collect();
        Some(Rule { group, titles })
    }

    /// The group name this rule applies to.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// True when the rule carries at least one title field. Rules without one
    /// are tolerated but can never produce a title.
    pub fn is_well_formed(&self) -> bool {
        !self.titles.is_empty()
    }

    /// Case-insensitive, trim-insensitive exact match against a group name.
    /// No substring or prefix matching.
    pub fn matches_group(&self, group: &str) -> bool {
        self.group.to_lowercase() == group.trim().to_lowercase()
    }

    /// Title field for a trust level: level *n* maps to the *n*-th title
    /// field. Levels outside 1..=4 never map; absent fields return `None`.
    pub fn title_for(&self, trust_level: u8) -> Option<&str> {
        match trust_level {
            1..=4 => self.titles.get(trust_level as usize - 1).map(String::as_str),
            _ => None,
        }
    }
}

/// Ordered collection of [`Rule`]s parsed from configuration.
///
/// Insertion order is preserved; when two rules name the same group
/// (case-insensitively), the earlier one is authoritative. Duplicates are not
/// removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Parse configured rule entries into a rule set. Each entry may carry
    /// several newline-separated rule lines; blank lines are dropped.
    pub fn parse<I, S>(entries: I) -> RuleSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = entries
            .into_iter()
            .flat_map(|entry| {
                entry
                    .as_ref()
                    .lines()
                    .filter_map(Rule::parse)
                    .collect::<Vec<_>>()
            })
            .collect();
        RuleSet { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// First rule whose group name matches, well-formed or not.
    pub fn find_group(&self, group: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches_group(group))
    }
}
