//! Command type definitions
//!
//! A [`ParsedCommand`] keeps argument text exactly as typed. JSON decoding
//! happens later, in the executor, so that a malformed argument becomes a
//! data error instead of a parse failure.

/// Represents a parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    /// `db.<collection>.<method>(...)`
    NamedMethodCall(MethodCall),

    /// `db.<method>(...)` acting on the selected database
    DatabaseLevelCall {
        method: DatabaseMethod,
        args: Vec<String>,
    },

    /// Input starting with `{`, run verbatim as a database command
    RawCommandDocument(String),

    /// `show ...` and `use ...`
    ShellDirective(ShellDirective),

    /// Input that matches no supported form
    Unknown(String),
}

/// A collection method invocation
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Collection name
    pub collection: String,

    /// Method with aliases resolved
    pub method: CollectionMethod,

    /// Argument texts, split on top-level commas
    pub args: Vec<String>,

    /// Cursor modifiers chained after `find(...)`
    pub modifiers: CursorModifiers,
}

/// Collection-scope methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionMethod {
    Find,
    FindOne,
    CountDocuments,
    Distinct,
    GetIndexes,
    Stats,
    Drop,
    InsertOne,
    Insert,
    InsertMany,
    UpdateOne,
    UpdateMany,
    DeleteOne,
    DeleteMany,
    Aggregate,
    CreateIndex,
    DropIndex,
}

impl CollectionMethod {
    /// Resolve a shell method name, including the `count` and `remove` aliases
    pub fn from_name(name: &str) -> Option<Self> {
        let method = match name {
            "find" => Self::Find,
            "findOne" => Self::FindOne,
            "countDocuments" | "count" => Self::CountDocuments,
            "distinct" => Self::Distinct,
            "getIndexes" => Self::GetIndexes,
            "stats" => Self::Stats,
            "drop" => Self::Drop,
            "insertOne" => Self::InsertOne,
            "insert" => Self::Insert,
            "insertMany" => Self::InsertMany,
            "updateOne" => Self::UpdateOne,
            "updateMany" => Self::UpdateMany,
            "deleteOne" => Self::DeleteOne,
            "deleteMany" | "remove" => Self::DeleteMany,
            "aggregate" => Self::Aggregate,
            "createIndex" => Self::CreateIndex,
            "dropIndex" => Self::DropIndex,
            _ => return None,
        };
        Some(method)
    }

    /// Canonical shell name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Find => "find",
            Self::FindOne => "findOne",
            Self::CountDocuments => "countDocuments",
            Self::Distinct => "distinct",
            Self::GetIndexes => "getIndexes",
            Self::Stats => "stats",
            Self::Drop => "drop",
            Self::InsertOne => "insertOne",
            Self::Insert => "insert",
            Self::InsertMany => "insertMany",
            Self::UpdateOne => "updateOne",
            Self::UpdateMany => "updateMany",
            Self::DeleteOne => "deleteOne",
            Self::DeleteMany => "deleteMany",
            Self::Aggregate => "aggregate",
            Self::CreateIndex => "createIndex",
            Self::DropIndex => "dropIndex",
        }
    }
}

/// Database-scope methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseMethod {
    GetCollectionNames,
    Stats,
    CreateCollection,
    DropDatabase,
}

impl DatabaseMethod {
    /// Canonical shell name
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetCollectionNames => "getCollectionNames",
            Self::Stats => "stats",
            Self::CreateCollection => "createCollection",
            Self::DropDatabase => "dropDatabase",
        }
    }
}

/// Shell directives that are not method calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellDirective {
    /// `show dbs` / `show databases`
    ShowDatabases,

    /// `show collections` / `show tables`
    ShowCollections,

    /// `use <name>`
    Use(String),
}

/// Modifiers chained after `find(...)`, kept as raw argument text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorModifiers {
    pub limit: Option<String>,
    pub skip: Option<String>,
    pub sort: Option<String>,
    pub projection: Option<String>,
}

impl CursorModifiers {
    /// Whether no modifier was given
    pub fn is_empty(&self) -> bool {
        self.limit.is_none()
            && self.skip.is_none()
            && self.sort.is_none()
            && self.projection.is_none()
    }

    /// Record one chained call; returns false for an unsupported modifier
    pub(crate) fn set(&mut self, name: &str, args: String) -> bool {
        let slot = match name {
            "limit" => &mut self.limit,
            "skip" => &mut self.skip,
            "sort" => &mut self.sort,
            "projection" | "project" => &mut self.projection,
            _ => return false,
        };
        *slot = Some(args);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_aliases() {
        assert_eq!(
            CollectionMethod::from_name("count"),
            Some(CollectionMethod::CountDocuments)
        );
        assert_eq!(
            CollectionMethod::from_name("remove"),
            Some(CollectionMethod::DeleteMany)
        );
        assert_eq!(CollectionMethod::from_name("mapReduce"), None);
    }

    #[test]
    fn test_method_names_resolve_back() {
        for method in [
            CollectionMethod::Find,
            CollectionMethod::Insert,
            CollectionMethod::DropIndex,
        ] {
            assert_eq!(CollectionMethod::from_name(method.name()), Some(method));
        }
    }

    #[test]
    fn test_modifiers_set() {
        let mut modifiers = CursorModifiers::default();
        assert!(modifiers.is_empty());
        assert!(modifiers.set("limit", "5".to_string()));
        assert!(modifiers.set("project", "{\"a\": 1}".to_string()));
        assert!(!modifiers.set("explain", String::new()));
        assert_eq!(modifiers.limit.as_deref(), Some("5"));
        assert_eq!(modifiers.projection.as_deref(), Some("{\"a\": 1}"));
    }
}
