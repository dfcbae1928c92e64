//! Declarative translation between persisted snapshots and view shapes.
//!
//! A [`Definition`] pairs one source type (the persisted version payload)
//! with one target type (the externally-facing view) and carries an
//! ordered list of mapping rules declared once via a typed builder. The
//! two entry points are [`Definition::to_view`] and
//! [`Definition::to_source`]; either direction may be declared
//! unsupported, which is distinct from a runtime mapping failure.
//!
//! Rules are plain closures resolved at compile time through generics,
//! with no runtime type inspection. They run lazily in declaration order, so a
//! later rule may read values an earlier rule already produced on the
//! partially-built output.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::CoreError;
use crate::language::{LanguageCache, LanguageCode};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Mapping direction, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToView,
    ToSource,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToView => "to_view",
            Self::ToSource => "to_source",
        }
    }
}

/// Failures raised by the translation engine.
///
/// `DirectionNotSupported` signals an inherently one-way definition being
/// driven the wrong way; `UnknownLanguage` is a data-integrity fault.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("Translator '{definition}' does not support {}", direction.as_str())]
    DirectionNotSupported {
        definition: &'static str,
        direction: Direction,
    },

    #[error("Unknown language code '{0}' in localized values")]
    UnknownLanguage(String),
}

impl From<TranslateError> for CoreError {
    fn from(err: TranslateError) -> Self {
        CoreError::Mapping(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

type ForwardFn<S, T> = Box<dyn Fn(&S, &mut T) -> Result<(), TranslateError> + Send + Sync>;
type BackwardFn<S, T> = Box<dyn Fn(&T, &mut S) -> Result<(), TranslateError> + Send + Sync>;

/// One mapping rule. A rule without a forward closure is write-only and
/// skipped by `to_view`; without a backward closure it is read-only.
struct Rule<S, T> {
    name: &'static str,
    forward: Option<ForwardFn<S, T>>,
    backward: Option<BackwardFn<S, T>>,
}

/// Which directions a definition implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionSupport {
    Both,
    ViewOnly,
    SourceOnly,
}

/// How a collection rule treats existing elements on the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionSemantics {
    /// The submitted collection fully replaces the stored one.
    Replace,
    /// Submitted elements are matched into the stored collection by key;
    /// unmatched stored elements are kept.
    Merge,
}

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// A declarative, reusable (Source, Target) mapping.
pub struct Definition<S, T> {
    name: &'static str,
    support: DirectionSupport,
    rules: Vec<Rule<S, T>>,
    includes: Vec<&'static str>,
}

impl<S: 'static, T: 'static> Definition<S, T> {
    /// Start a bidirectional definition.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            support: DirectionSupport::Both,
            rules: Vec::new(),
            includes: Vec::new(),
        }
    }

    /// Restrict the definition to one direction.
    pub fn support(mut self, support: DirectionSupport) -> Self {
        self.support = support;
        self
    }

    /// Declare related sub-trees that must be eagerly loaded before this
    /// definition runs, so no rule trips over a partially-loaded source.
    pub fn includes(mut self, paths: &[&'static str]) -> Self {
        self.includes.extend_from_slice(paths);
        self
    }

    /// Sub-trees the loading layer must fetch up front.
    pub fn required_includes(&self) -> &[&'static str] {
        &self.includes
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    // -- rule constructors --------------------------------------------------

    /// Copy/compute one value in both directions.
    pub fn simple<F, B>(mut self, name: &'static str, forward: F, backward: B) -> Self
    where
        F: Fn(&S, &mut T) + Send + Sync + 'static,
        B: Fn(&T, &mut S) + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            name,
            forward: Some(Box::new(move |s, t| {
                forward(s, t);
                Ok(())
            })),
            backward: Some(Box::new(move |t, s| {
                backward(t, s);
                Ok(())
            })),
        });
        self
    }

    /// A field that only exists on the view.
    pub fn read_only<F>(mut self, name: &'static str, forward: F) -> Self
    where
        F: Fn(&S, &mut T) + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            name,
            forward: Some(Box::new(move |s, t| {
                forward(s, t);
                Ok(())
            })),
            backward: None,
        });
        self
    }

    /// A field that is only ever written back to the source.
    pub fn write_only<B>(mut self, name: &'static str, backward: B) -> Self
    where
        B: Fn(&T, &mut S) + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            name,
            forward: None,
            backward: Some(Box::new(move |t, s| {
                backward(t, s);
                Ok(())
            })),
        });
        self
    }

    /// Create-vs-update dispatch: the single place identity is resolved.
    ///
    /// When the view carries an identifier the source row is updated in
    /// place; when it does not, `new_id` mints one. Running the write path
    /// twice over an unchanged view therefore never creates a second row.
    pub fn dispatch<I, G, A, N>(
        mut self,
        name: &'static str,
        view_id: G,
        assign: A,
        new_id: N,
    ) -> Self
    where
        I: Clone + Send + Sync + 'static,
        G: Fn(&T) -> Option<I> + Send + Sync + 'static,
        A: Fn(&mut S, I) + Send + Sync + 'static,
        N: Fn() -> I + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            name,
            forward: None,
            backward: Some(Box::new(move |t, s| {
                match view_id(t) {
                    Some(id) => assign(s, id),
                    None => assign(s, new_id()),
                }
                Ok(())
            })),
        });
        self
    }

    /// Delegate a nested one-to-one object to another definition.
    pub fn navigation<S2, T2, GS, ST, GT, SS>(
        mut self,
        name: &'static str,
        child: Arc<Definition<S2, T2>>,
        get_source: GS,
        set_target: ST,
        get_target: GT,
        set_source: SS,
    ) -> Self
    where
        S2: Default + Clone + 'static,
        T2: Default + 'static,
        GS: Fn(&S) -> Option<&S2> + Send + Sync + 'static,
        ST: Fn(&mut T, T2) + Send + Sync + 'static,
        GT: Fn(&T) -> Option<&T2> + Send + Sync + 'static,
        SS: Fn(&mut S, S2) + Send + Sync + 'static,
    {
        let forward_child = Arc::clone(&child);
        let forward_get = Arc::new(get_source);
        let backward_get = Arc::clone(&forward_get);
        self.rules.push(Rule {
            name,
            forward: Some(Box::new(move |s, t| {
                if let Some(nested) = (*forward_get)(s) {
                    set_target(t, forward_child.to_view(nested)?);
                }
                Ok(())
            })),
            backward: Some(Box::new(move |t, s| {
                if let Some(nested_view) = get_target(t) {
                    let existing = (*backward_get)(s).cloned();
                    set_source(s, child.to_source(nested_view, existing)?);
                }
                Ok(())
            })),
        });
        self
    }

    /// Delegate each element of a one-to-many relationship to another
    /// definition. On the write path elements are matched into the stored
    /// collection by `matches`, so unchanged saves update in place.
    #[allow(clippy::too_many_arguments)]
    pub fn collection<S2, T2, GS, ST, GT, SS, M>(
        mut self,
        name: &'static str,
        child: Arc<Definition<S2, T2>>,
        semantics: CollectionSemantics,
        get_source: GS,
        set_target: ST,
        get_target: GT,
        set_source: SS,
        matches: M,
    ) -> Self
    where
        S2: Default + Clone + 'static,
        T2: Default + 'static,
        GS: Fn(&S) -> &[S2] + Send + Sync + 'static,
        ST: Fn(&mut T, Vec<T2>) + Send + Sync + 'static,
        GT: Fn(&T) -> &[T2] + Send + Sync + 'static,
        SS: Fn(&mut S, Vec<S2>) + Send + Sync + 'static,
        M: Fn(&S2, &T2) -> bool + Send + Sync + 'static,
    {
        let forward_child = Arc::clone(&child);
        let forward_get = Arc::new(get_source);
        let backward_get = Arc::clone(&forward_get);
        self.rules.push(Rule {
            name,
            forward: Some(Box::new(move |s, t| {
                let mut views = Vec::new();
                for element in (*forward_get)(s) {
                    views.push(forward_child.to_view(element)?);
                }
                set_target(t, views);
                Ok(())
            })),
            backward: Some(Box::new(move |t, s| {
                let stored: Vec<S2> = (*backward_get)(s).to_vec();
                let mut merged = Vec::new();
                let mut matched = vec![false; stored.len()];
                for view in get_target(t) {
                    let existing = stored.iter().enumerate().find_map(|(i, el)| {
                        if !matched[i] && matches(el, view) {
                            matched[i] = true;
                            Some(el.clone())
                        } else {
                            None
                        }
                    });
                    merged.push(child.to_source(view, existing)?);
                }
                if semantics == CollectionSemantics::Merge {
                    for (i, el) in stored.into_iter().enumerate() {
                        if !matched[i] {
                            merged.push(el);
                        }
                    }
                }
                set_source(s, merged);
                Ok(())
            })),
        });
        self
    }

    /// Map per-language sub-objects to/from a language-keyed dictionary.
    ///
    /// Language selection is driven by the injected [`LanguageCache`];
    /// a dictionary key outside the cache is a mapping fault.
    #[allow(clippy::too_many_arguments)]
    pub fn localized<L, V, GS, LO, VO, ST, GT, ME, SS>(
        mut self,
        name: &'static str,
        cache: Arc<LanguageCache>,
        get_source: GS,
        language_of: LO,
        value_of: VO,
        set_target: ST,
        get_target: GT,
        make_entry: ME,
        set_source: SS,
    ) -> Self
    where
        L: Clone + 'static,
        V: Clone + 'static,
        GS: Fn(&S) -> &[L] + Send + Sync + 'static,
        LO: Fn(&L) -> &LanguageCode + Send + Sync + 'static,
        VO: Fn(&L) -> V + Send + Sync + 'static,
        ST: Fn(&mut T, BTreeMap<String, V>) + Send + Sync + 'static,
        GT: Fn(&T) -> &BTreeMap<String, V> + Send + Sync + 'static,
        ME: Fn(LanguageCode, V) -> L + Send + Sync + 'static,
        SS: Fn(&mut S, Vec<L>) + Send + Sync + 'static,
    {
        let forward_cache = Arc::clone(&cache);
        self.rules.push(Rule {
            name,
            forward: Some(Box::new(move |s, t| {
                let mut dictionary = BTreeMap::new();
                for entry in get_source(s) {
                    let code = language_of(entry);
                    if !forward_cache.contains(code) {
                        return Err(TranslateError::UnknownLanguage(code.to_string()));
                    }
                    dictionary.insert(code.as_str().to_string(), value_of(entry));
                }
                set_target(t, dictionary);
                Ok(())
            })),
            backward: Some(Box::new(move |t, s| {
                let mut entries = Vec::new();
                for (code, value) in get_target(t) {
                    let code = LanguageCode::new(code);
                    if !cache.contains(&code) {
                        return Err(TranslateError::UnknownLanguage(code.to_string()));
                    }
                    entries.push(make_entry(code, value.clone()));
                }
                set_source(s, entries);
                Ok(())
            })),
        });
        self
    }

    // -- entry points -------------------------------------------------------

    /// Translate a persisted snapshot into its view representation.
    pub fn to_view(&self, source: &S) -> Result<T, TranslateError>
    where
        T: Default,
    {
        if self.support == DirectionSupport::SourceOnly {
            return Err(TranslateError::DirectionNotSupported {
                definition: self.name,
                direction: Direction::ToView,
            });
        }
        let mut target = T::default();
        for rule in &self.rules {
            if let Some(forward) = &rule.forward {
                forward(source, &mut target)?;
            }
        }
        Ok(target)
    }

    /// Translate a view back into a persisted snapshot.
    ///
    /// `existing` seeds the update path; `None` means the create path,
    /// starting from `S::default()` and letting the dispatch rule mint
    /// identity.
    pub fn to_source(&self, target: &T, existing: Option<S>) -> Result<S, TranslateError>
    where
        S: Default,
    {
        if self.support == DirectionSupport::ViewOnly {
            return Err(TranslateError::DirectionNotSupported {
                definition: self.name,
                direction: Direction::ToSource,
            });
        }
        let mut source = existing.unwrap_or_default();
        for rule in &self.rules {
            if let Some(backward) = &rule.backward {
                backward(target, &mut source)?;
            }
        }
        Ok(source)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
