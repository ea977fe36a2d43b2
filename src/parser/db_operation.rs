//! Database operation parser
//!
//! This module recognizes the `db.` forms:
//! - db.collection.method(args)[.limit(n)][.skip(n)][.sort(spec)]
//! - db.getCollection('name').method(args)
//! - db.method(args) for database-scope calls
//!
//! A regex anchors the literal method name; the argument list is then
//! delimited by a bracket-aware scan so that JSON containing parentheses or
//! commas inside strings is captured whole.

use regex::Regex;
use std::sync::LazyLock;

use crate::parser::command::{
    CollectionMethod, CursorModifiers, DatabaseMethod, MethodCall, ParsedCommand,
};
use crate::parser::scanner::{find_closing_paren, parse_call_chain, split_top_level};

static GET_COLLECTION_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^db\.getCollection\(\s*['"](?P<coll>[^'"]+)['"]\s*\)\s*\.\s*(?P<method>\w+)\s*\("#)
        .expect("valid getCollection pattern")
});

static COLLECTION_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^db\.(?P<coll>[A-Za-z_$][\w$.\-]*?)\s*\.\s*(?P<method>\w+)\s*\(")
        .expect("valid collection call pattern")
});

static DATABASE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^db\.(?P<method>\w+)\s*\(").expect("valid database call pattern")
});

/// Parser for database operations
pub struct DbOperationParser;

impl DbOperationParser {
    /// Parse the zero-argument introspection calls
    ///
    /// `db.getCollectionNames()` and `db.stats()`
    pub fn parse_introspection(input: &str) -> Option<ParsedCommand> {
        let (method, args) = Self::database_call(input)?;
        if !args.is_empty() {
            return None;
        }

        let method = match method {
            "getCollectionNames" => DatabaseMethod::GetCollectionNames,
            "stats" => DatabaseMethod::Stats,
            _ => return None,
        };

        Some(ParsedCommand::DatabaseLevelCall {
            method,
            args: Vec::new(),
        })
    }

    /// Parse a collection method call, with cursor modifiers after `find`
    pub fn parse_collection_call(input: &str) -> Option<ParsedCommand> {
        let captures = GET_COLLECTION_CALL
            .captures(input)
            .or_else(|| COLLECTION_CALL.captures(input))?;

        let collection = captures.name("coll")?.as_str().to_string();
        let method = CollectionMethod::from_name(captures.name("method")?.as_str())?;

        let open = captures.get(0)?.end() - 1;
        let close = find_closing_paren(input, open)?;
        let args = split_top_level(&input[open + 1..close]);
        let rest = &input[close + 1..];

        let mut modifiers = CursorModifiers::default();
        if method == CollectionMethod::Find {
            for (name, chained_args) in parse_call_chain(rest)? {
                if !modifiers.set(&name, chained_args) {
                    return None;
                }
            }
        } else if !rest.trim().is_empty() {
            return None;
        }

        Some(ParsedCommand::NamedMethodCall(MethodCall {
            collection,
            method,
            args,
            modifiers,
        }))
    }

    /// Parse the database-scope calls that change state
    ///
    /// `db.createCollection('name')` and `db.dropDatabase()`
    pub fn parse_database_call(input: &str) -> Option<ParsedCommand> {
        let (method, args) = Self::database_call(input)?;

        let method = match method {
            "createCollection" => DatabaseMethod::CreateCollection,
            "dropDatabase" if args.is_empty() => DatabaseMethod::DropDatabase,
            _ => return None,
        };

        Some(ParsedCommand::DatabaseLevelCall { method, args })
    }

    /// Method name and arguments of a whole-input `db.<method>(...)` call.
    fn database_call(input: &str) -> Option<(&str, Vec<String>)> {
        let captures = DATABASE_CALL.captures(input)?;
        let method = captures.name("method")?.as_str();

        let open = captures.get(0)?.end() - 1;
        let close = find_closing_paren(input, open)?;
        if !input[close + 1..].trim().is_empty() {
            return None;
        }

        Some((method, split_top_level(&input[open + 1..close])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(input: &str) -> MethodCall {
        match DbOperationParser::parse_collection_call(input) {
            Some(ParsedCommand::NamedMethodCall(call)) => call,
            other => panic!("expected method call for {input}, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_find_with_modifiers_in_any_order() {
        let parsed = call(r#"db.users.find({"age": {"$gt": 18}}).sort({"name": 1}).limit(10).skip(5)"#);
        assert_eq!(parsed.collection, "users");
        assert_eq!(parsed.method, CollectionMethod::Find);
        assert_eq!(parsed.args, vec![r#"{"age": {"$gt": 18}}"#]);
        assert_eq!(parsed.modifiers.limit.as_deref(), Some("10"));
        assert_eq!(parsed.modifiers.skip.as_deref(), Some("5"));
        assert_eq!(parsed.modifiers.sort.as_deref(), Some(r#"{"name": 1}"#));
    }

    #[test]
    fn test_parse_find_without_args() {
        let parsed = call("db.users.find()");
        assert!(parsed.args.is_empty());
        assert!(parsed.modifiers.is_empty());
    }

    #[test]
    fn test_parse_find_with_projection_argument() {
        let parsed = call(r#"db.users.find({}, {"name": 1, "_id": 0})"#);
        assert_eq!(parsed.args, vec!["{}", r#"{"name": 1, "_id": 0}"#]);
    }

    #[test]
    fn test_unknown_modifier_is_no_match() {
        assert!(DbOperationParser::parse_collection_call("db.users.find().explain()").is_none());
    }

    #[test]
    fn test_modifiers_only_follow_find() {
        assert!(DbOperationParser::parse_collection_call("db.users.findOne({}).limit(1)").is_none());
    }

    #[test]
    fn test_parse_dotted_collection_name() {
        let parsed = call("db.system.users.countDocuments({})");
        assert_eq!(parsed.collection, "system.users");
        assert_eq!(parsed.method, CollectionMethod::CountDocuments);
    }

    #[test]
    fn test_parse_get_collection_form() {
        let parsed = call(r#"db.getCollection('order-items').insertOne({"sku": "A1"})"#);
        assert_eq!(parsed.collection, "order-items");
        assert_eq!(parsed.method, CollectionMethod::InsertOne);
    }

    #[test]
    fn test_parse_two_argument_update() {
        let parsed = call(r#"db.users.updateMany({"active": false}, {"$set": {"note": "a, (b)"}})"#);
        assert_eq!(parsed.method, CollectionMethod::UpdateMany);
        assert_eq!(parsed.args.len(), 2);
        assert_eq!(parsed.args[1], r#"{"$set": {"note": "a, (b)"}}"#);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(call("db.c.count()").method, CollectionMethod::CountDocuments);
        assert_eq!(call("db.c.remove({})").method, CollectionMethod::DeleteMany);
    }

    #[test]
    fn test_unsupported_method_is_no_match() {
        assert!(DbOperationParser::parse_collection_call("db.users.mapReduce()").is_none());
        assert!(DbOperationParser::parse_collection_call("db.users.find(").is_none());
    }

    #[test]
    fn test_parse_introspection() {
        assert_eq!(
            DbOperationParser::parse_introspection("db.getCollectionNames()"),
            Some(ParsedCommand::DatabaseLevelCall {
                method: DatabaseMethod::GetCollectionNames,
                args: Vec::new(),
            })
        );
        assert!(DbOperationParser::parse_introspection("db.stats( )").is_some());
        assert!(DbOperationParser::parse_introspection("db.dropDatabase()").is_none());
    }

    #[test]
    fn test_parse_database_call() {
        assert_eq!(
            DbOperationParser::parse_database_call("db.createCollection('logs')"),
            Some(ParsedCommand::DatabaseLevelCall {
                method: DatabaseMethod::CreateCollection,
                args: vec!["'logs'".to_string()],
            })
        );
        assert!(DbOperationParser::parse_database_call("db.dropDatabase()").is_some());
        assert!(DbOperationParser::parse_database_call("db.dropDatabase('x')").is_none());
        assert!(DbOperationParser::parse_database_call("db.stats()").is_none());
    }
}
