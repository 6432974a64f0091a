//! Topic to database routing

use std::collections::{BTreeMap, HashMap};

use couchsink_core::domain::{DatabaseName, DomainError};

/// Immutable routing table from stream topic to target database
#[derive(Debug, Clone, Default)]
pub struct TopicRouter {
    routes: HashMap<String, DatabaseName>,
}

impl TopicRouter {
    /// Builds the table from the `topics` configuration section
    ///
    /// # Errors
    /// Returns error if any database name is invalid
    pub fn from_topics(topics: &BTreeMap<String, String>) -> Result<Self, DomainError> {
        let routes = topics
            .iter()
            .map(|(topic, db)| Ok((topic.clone(), DatabaseName::new(db.clone())?)))
            .collect::<Result<HashMap<_, _>, DomainError>>()?;
        Ok(Self { routes })
    }

    /// Adds or replaces a route
    pub fn with_route(mut self, topic: impl Into<String>, database: DatabaseName) -> Self {
        self.routes.insert(topic.into(), database);
        self
    }

    /// Returns the database for a topic
    pub fn route(&self, topic: &str) -> Option<&DatabaseName> {
        self.routes.get(topic)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
