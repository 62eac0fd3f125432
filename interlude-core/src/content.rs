//! Content shown while a user waits.
//!
//! Micro poses, tips and facts are keyed by character with a `default`
//! fallback. Verifications and features are flat lists shared by every
//! character.

use crate::phase::PhaseKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key of the fallback entry in character-scoped categories.
pub const DEFAULT_CHARACTER_KEY: &str = "default";

/// Content categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    MicroPoses,
    Tips,
    Facts,
    Verifications,
    Features,
}

impl Category {
    /// The category a phase draws from.
    pub fn for_phase(kind: PhaseKind) -> Self {
        match kind {
            PhaseKind::Micro => Category::MicroPoses,
            PhaseKind::Tip => Category::Tips,
            PhaseKind::Fact => Category::Facts,
            PhaseKind::Verify => Category::Verifications,
            PhaseKind::Discover => Category::Features,
        }
    }

    /// Whether entries are looked up by character.
    pub fn is_character_scoped(&self) -> bool {
        matches!(
            self,
            Category::MicroPoses | Category::Tips | Category::Facts
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::MicroPoses => "microPoses",
            Category::Tips => "tips",
            Category::Facts => "facts",
            Category::Verifications => "verifications",
            Category::Features => "features",
        };
        f.write_str(name)
    }
}

/// How a verification expects to be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    Text,
    Choice,
    Confirm,
}

/// A question asking the user to confirm or correct something about their
/// request while it is processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub question: String,
    /// The request field this answer updates.
    pub field: String,
    #[serde(rename = "type")]
    pub answer_type: AnswerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Verification {
    pub fn text(question: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            field: field.into(),
            answer_type: AnswerType::Text,
            options: None,
        }
    }

    pub fn confirm(question: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            answer_type: AnswerType::Confirm,
            ..Self::text(question, field)
        }
    }

    pub fn choice(
        question: impl Into<String>,
        field: impl Into<String>,
        options: &[&str],
    ) -> Self {
        Self {
            answer_type: AnswerType::Choice,
            options: Some(options.iter().map(|o| o.to_string()).collect()),
            ..Self::text(question, field)
        }
    }
}

/// A product feature suggested once the wait runs long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub prompt: String,
    pub description: String,
    /// Action identifier the host performs if the user accepts.
    pub action: String,
}

impl Feature {
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        description: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            description: description.into(),
            action: action.into(),
        }
    }
}

/// Lists keyed by character id, with a `default` fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterContent<T> {
    entries: BTreeMap<String, Vec<T>>,
}

impl<T> CharacterContent<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace one character's list.
    pub fn with(mut self, character: impl Into<String>, items: Vec<T>) -> Self {
        self.entries.insert(character.into(), items);
        self
    }

    /// The character's list, else the `default` list, else nothing.
    pub fn resolve(&self, character: &str) -> &[T] {
        self.entries
            .get(character)
            .or_else(|| self.entries.get(DEFAULT_CHARACTER_KEY))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn characters(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn has_character(&self, character: &str) -> bool {
        self.entries.contains_key(character)
    }
}

/// A category's resolved content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentList<'a> {
    Text(&'a [String]),
    Verifications(&'a [Verification]),
    Features(&'a [Feature]),
}

impl ContentList<'_> {
    pub fn len(&self) -> usize {
        match self {
            ContentList::Text(items) => items.len(),
            ContentList::Verifications(items) => items.len(),
            ContentList::Features(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A partial repository. Every category present replaces the whole category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub micro_poses: Option<CharacterContent<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tips: Option<CharacterContent<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facts: Option<CharacterContent<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifications: Option<Vec<Verification>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<Feature>>,
}

impl ContentOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_micro_poses(mut self, poses: CharacterContent<String>) -> Self {
        self.micro_poses = Some(poses);
        self
    }

    pub fn with_tips(mut self, tips: CharacterContent<String>) -> Self {
        self.tips = Some(tips);
        self
    }

    pub fn with_facts(mut self, facts: CharacterContent<String>) -> Self {
        self.facts = Some(facts);
        self
    }

    pub fn with_verifications(mut self, verifications: Vec<Verification>) -> Self {
        self.verifications = Some(verifications);
        self
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = Some(features);
        self
    }

    /// Categories this override replaces.
    pub fn categories(&self) -> Vec<Category> {
        let mut categories = Vec::new();
        if self.micro_poses.is_some() {
            categories.push(Category::MicroPoses);
        }
        if self.tips.is_some() {
            categories.push(Category::Tips);
        }
        if self.facts.is_some() {
            categories.push(Category::Facts);
        }
        if self.verifications.is_some() {
            categories.push(Category::Verifications);
        }
        if self.features.is_some() {
            categories.push(Category::Features);
        }
        categories
    }
}

/// All content available to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRepository {
    pub micro_poses: CharacterContent<String>,
    pub tips: CharacterContent<String>,
    pub facts: CharacterContent<String>,
    pub verifications: Vec<Verification>,
    pub features: Vec<Feature>,
}

impl ContentRepository {
    /// A repository with no content at all.
    pub fn empty() -> Self {
        Self {
            micro_poses: CharacterContent::new(),
            tips: CharacterContent::new(),
            facts: CharacterContent::new(),
            verifications: Vec::new(),
            features: Vec::new(),
        }
    }

    pub fn micro_poses(&self, character: &str) -> &[String] {
        self.micro_poses.resolve(character)
    }

    pub fn tips(&self, character: &str) -> &[String] {
        self.tips.resolve(character)
    }

    pub fn facts(&self, character: &str) -> &[String] {
        self.facts.resolve(character)
    }

    pub fn verifications(&self) -> &[Verification] {
        &self.verifications
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Resolve a category for a character. Flat categories ignore the
    /// character.
    pub fn resolve(&self, category: Category, character: &str) -> ContentList<'_> {
        match category {
            Category::MicroPoses => ContentList::Text(self.micro_poses(character)),
            Category::Tips => ContentList::Text(self.tips(character)),
            Category::Facts => ContentList::Text(self.facts(character)),
            Category::Verifications => ContentList::Verifications(self.verifications()),
            Category::Features => ContentList::Features(self.features()),
        }
    }

    /// Replace every category present in `partial`, wholesale.
    ///
    /// Character keys inside a category are not merged: overriding `tips`
    /// with only a `default` list drops every other character's tips.
    pub fn apply_override(&mut self, partial: ContentOverride) {
        if let Some(micro_poses) = partial.micro_poses {
            self.micro_poses = micro_poses;
        }
        if let Some(tips) = partial.tips {
            self.tips = tips;
        }
        if let Some(facts) = partial.facts {
            self.facts = facts;
        }
        if let Some(verifications) = partial.verifications {
            self.verifications = verifications;
        }
        if let Some(features) = partial.features {
            self.features = features;
        }
    }
}

impl Default for ContentRepository {
    fn default() -> Self {
        DEFAULT_CONTENT.clone()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Built-in content
// ============================================================================

lazy_static::lazy_static! {
    /// Content shipped with the companion.
    pub static ref DEFAULT_CONTENT: ContentRepository = ContentRepository {
        micro_poses: CharacterContent::new()
            .with(DEFAULT_CHARACTER_KEY, strings(&["idle", "blink", "wave", "stretch"]))
            .with("kyur", strings(&[
                "wave", "hop", "tail-swish", "peek", "stretch", "spin",
            ])),
        tips: CharacterContent::new()
            .with(DEFAULT_CHARACTER_KEY, strings(&[
                "Good lighting makes a big difference. Face a window if you can.",
                "Keep your head level with the camera for the cleanest result.",
                "Plain backgrounds help the model focus on you.",
                "You can switch styles later without taking a new photo.",
            ]))
            .with("kyur", strings(&[
                "Kyur says: soft, even light keeps your features crisp!",
                "Kyur's trick: relax your shoulders before the snap.",
                "Tilt your chin slightly. Kyur swears it works.",
                "Glasses glare? Kyur suggests angling them down a touch.",
                "Kyur likes a neutral expression for the base model.",
            ])),
        facts: CharacterContent::new()
            .with(DEFAULT_CHARACTER_KEY, strings(&[
                "Your avatar is built from thousands of tiny triangles.",
                "The first pass finds your face; later passes add style.",
                "A 3D model is stored as a mesh plus a texture map.",
                "Style transfer blends your photo with an artistic reference.",
            ]))
            .with("kyur", strings(&[
                "Kyur was sketched over a hundred times before this version.",
                "Kyur's ears are modeled separately so they can wiggle.",
                "Every Kyur pose started as a hand-drawn sprite.",
                "Kyur's colors were picked to stay readable on dark screens.",
            ])),
        verifications: vec![
            Verification::choice(
                "Which style should we lean into?",
                "style",
                &["anime", "pixel", "clay", "comic"],
            ),
            Verification::text("What name should appear on your avatar card?", "displayName"),
            Verification::confirm("Should we keep your glasses in the model?", "keepAccessories"),
            Verification::choice(
                "How should your avatar's expression look?",
                "expression",
                &["smile", "neutral", "determined"],
            ),
        ],
        features: vec![
            Feature::new(
                "animate",
                "Want to see your avatar move?",
                "Add idle animations to your finished avatar.",
                "open_animation_studio",
            ),
            Feature::new(
                "print",
                "Fancy a figurine?",
                "Order a 3D-printed figure of your avatar.",
                "open_print_shop",
            ),
            Feature::new(
                "share",
                "Show it off?",
                "Share a turntable video of your avatar.",
                "open_share_sheet",
            ),
        ],
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_fallback_entries() {
        let repo = ContentRepository::default();
        assert!(repo.micro_poses.has_character(DEFAULT_CHARACTER_KEY));
        assert!(repo.tips.has_character(DEFAULT_CHARACTER_KEY));
        assert!(repo.facts.has_character(DEFAULT_CHARACTER_KEY));
        assert_eq!(repo.verifications().len(), 4);
        assert!(!repo.features().is_empty());
    }

    #[test]
    fn test_resolve_known_and_unknown_character() {
        let repo = ContentRepository::default();
        assert!(repo.tips("kyur")[0].starts_with("Kyur"));
        assert_eq!(repo.tips("nobody"), repo.tips(DEFAULT_CHARACTER_KEY));
    }

    #[test]
    fn test_missing_default_resolves_empty() {
        let content = CharacterContent::new().with("kyur", strings(&["hop"]));
        assert!(content.resolve("someone-else").is_empty());
        assert_eq!(content.resolve("kyur"), &["hop".to_string()]);
    }

    #[test]
    fn test_flat_categories_ignore_character() {
        let repo = ContentRepository::default();
        assert_eq!(
            repo.resolve(Category::Verifications, "kyur").len(),
            repo.resolve(Category::Verifications, "anyone").len()
        );
        assert!(matches!(
            repo.resolve(Category::Features, "kyur"),
            ContentList::Features(_)
        ));
        assert!(!Category::Features.is_character_scoped());
        assert!(Category::Tips.is_character_scoped());
    }

    #[test]
    fn test_every_phase_has_a_category() {
        let categories: Vec<_> = PhaseKind::ALL.iter().map(|k| Category::for_phase(*k)).collect();
        assert_eq!(
            categories,
            vec![
                Category::MicroPoses,
                Category::Tips,
                Category::Facts,
                Category::Verifications,
                Category::Features,
            ]
        );
    }

    #[test]
    fn test_override_replaces_whole_category() {
        let mut repo = ContentRepository::default();
        let facts_before = repo.facts.clone();

        repo.apply_override(
            ContentOverride::new()
                .with_tips(CharacterContent::new().with(DEFAULT_CHARACTER_KEY, strings(&["one"]))),
        );

        // kyur's tips are gone; it now falls back to the new default.
        assert!(!repo.tips.has_character("kyur"));
        assert_eq!(repo.tips("kyur"), &["one".to_string()]);
        // Untouched categories survive.
        assert_eq!(repo.facts, facts_before);
    }

    #[test]
    fn test_override_flat_lists() {
        let mut repo = ContentRepository::default();
        repo.apply_override(ContentOverride::new().with_verifications(vec![
            Verification::confirm("Ready?", "ready"),
        ]));
        assert_eq!(repo.verifications().len(), 1);
        assert_eq!(repo.features().len(), DEFAULT_CONTENT.features().len());
    }

    #[test]
    fn test_override_json_shape() {
        let partial: ContentOverride = serde_json::from_str(
            r#"{
                "tips": {"default": ["a", "b"]},
                "verifications": [
                    {"question": "Pick one", "field": "style", "type": "choice", "options": ["x", "y"]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            partial.categories(),
            vec![Category::Tips, Category::Verifications]
        );
        let verification = &partial.verifications.as_ref().unwrap()[0];
        assert_eq!(verification.answer_type, AnswerType::Choice);
        assert_eq!(verification.options.as_deref().map(<[String]>::len), Some(2));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(Category::MicroPoses.to_string(), "microPoses");
        assert_eq!(
            serde_json::to_string(&Category::Verifications).unwrap(),
            "\"verifications\""
        );
    }
}
