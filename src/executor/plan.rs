//! Translation of parsed commands into typed operations
//!
//! All argument JSON is decoded here, before a client is requested, so that a
//! typo in a filter is reported without opening a connection.

use mongodb::bson::{self, Bson, Document};
use mongodb::options::IndexOptions;
use serde_json::{Value as JsonValue, json};

use crate::codec;
use crate::error::ParseError;
use crate::parser::{
    CollectionMethod, CursorModifiers, DatabaseMethod, MethodCall, ParsedCommand,
    SUPPORTED_COMMANDS, ShellCommandParser, ShellDirective, unquote,
};

use super::result::{ExecutionResult, ResultData};

type PlanResult<T> = std::result::Result<T, ParseError>;

/// A driver call with every argument decoded
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Find {
        collection: String,
        filter: Document,
        projection: Option<Document>,
        sort: Option<Document>,
        limit: Option<i64>,
        skip: Option<u64>,
    },
    FindOne {
        collection: String,
        filter: Document,
        projection: Option<Document>,
    },
    CountDocuments {
        collection: String,
        filter: Document,
    },
    Distinct {
        collection: String,
        field: String,
        filter: Document,
    },
    GetIndexes {
        collection: String,
    },
    CollectionStats {
        collection: String,
    },
    DropCollection {
        collection: String,
    },
    InsertOne {
        collection: String,
        document: Document,
    },
    InsertMany {
        collection: String,
        documents: Vec<Document>,
    },
    UpdateOne {
        collection: String,
        filter: Document,
        update: UpdateSpec,
    },
    UpdateMany {
        collection: String,
        filter: Document,
        update: UpdateSpec,
    },
    DeleteOne {
        collection: String,
        filter: Document,
    },
    DeleteMany {
        collection: String,
        filter: Document,
    },
    Aggregate {
        collection: String,
        pipeline: Vec<Document>,
    },
    CreateIndex {
        collection: String,
        keys: Document,
        options: Option<Document>,
    },
    DropIndex {
        collection: String,
        name: String,
    },
    ListCollectionNames,
    DatabaseStats,
    CreateCollection {
        name: String,
    },
    DropDatabase,
    ListDatabases,
    RunCommand(Document),
}

/// Update argument: operator document or aggregation pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateSpec {
    Document(Document),
    Pipeline(Vec<Document>),
}

/// What to do with a parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Run an operation against the server
    Execute(Operation),

    /// Answer without touching the server
    Respond(ExecutionResult),
}

/// Turn a parsed command into a plan
///
/// JSON and argument problems are returned as a failed [`ExecutionResult`]
/// inside [`Plan::Respond`], never as an error.
pub fn plan(command: ParsedCommand) -> Plan {
    let planned = match command {
        ParsedCommand::NamedMethodCall(call) => plan_method_call(call),
        ParsedCommand::DatabaseLevelCall { method, args } => plan_database_call(method, &args),
        ParsedCommand::RawCommandDocument(text) => {
            parse_document(&text, "command").map(Operation::RunCommand)
        }
        ParsedCommand::ShellDirective(directive) => return plan_directive(directive),
        ParsedCommand::Unknown(input) => {
            return Plan::Respond(ExecutionResult::error_with(
                format!("Unknown command: {input}"),
                json!({ "supportedCommands": SUPPORTED_COMMANDS }),
            ));
        }
    };

    match planned {
        Ok(operation) => Plan::Execute(operation),
        Err(e) => Plan::Respond(ExecutionResult::error(e.to_string())),
    }
}

fn plan_directive(directive: ShellDirective) -> Plan {
    match directive {
        ShellDirective::ShowDatabases => Plan::Execute(Operation::ListDatabases),
        ShellDirective::ShowCollections => Plan::Execute(Operation::ListCollectionNames),
        ShellDirective::Use(name) if ShellCommandParser::is_valid_db_name(&name) => {
            Plan::Respond(ExecutionResult::from_data(ResultData::Json(json!({
                "message": format!("switched to db {name}"),
                "database": name,
            }))))
        }
        ShellDirective::Use(name) => {
            Plan::Respond(ExecutionResult::error(format!("Invalid database name: {name}")))
        }
    }
}

fn plan_database_call(method: DatabaseMethod, args: &[String]) -> PlanResult<Operation> {
    match method {
        DatabaseMethod::GetCollectionNames => Ok(Operation::ListCollectionNames),
        DatabaseMethod::Stats => Ok(Operation::DatabaseStats),
        DatabaseMethod::DropDatabase => Ok(Operation::DropDatabase),
        DatabaseMethod::CreateCollection => {
            let name = required_name(args, 0, "createCollection", "collection name")?;
            Ok(Operation::CreateCollection { name })
        }
    }
}

fn plan_method_call(call: MethodCall) -> PlanResult<Operation> {
    let MethodCall {
        collection,
        method,
        args,
        modifiers,
    } = call;

    let max_args = match method {
        CollectionMethod::Find | CollectionMethod::FindOne => 2,
        CollectionMethod::UpdateOne | CollectionMethod::UpdateMany => 2,
        CollectionMethod::Distinct | CollectionMethod::CreateIndex => 2,
        CollectionMethod::GetIndexes | CollectionMethod::Stats | CollectionMethod::Drop => 0,
        _ => 1,
    };
    if args.len() > max_args {
        return Err(ParseError::InvalidArgument(format!(
            "{} accepts at most {} argument(s), got {}",
            method.name(),
            max_args,
            args.len()
        )));
    }

    let operation = match method {
        CollectionMethod::Find => {
            let CursorModifiers {
                limit,
                skip,
                sort,
                projection,
            } = modifiers;

            let projection = match projection {
                Some(text) => Some(parse_document(&text, "projection")?),
                None => optional_document(&args, 1, "projection")?,
            };

            Operation::Find {
                collection,
                filter: filter_arg(&args, 0)?,
                projection,
                sort: sort.map(|text| parse_document(&text, "sort")).transpose()?,
                limit: limit.map(|text| parse_integer(&text, "limit")).transpose()?,
                skip: skip
                    .map(|text| parse_integer(&text, "skip"))
                    .transpose()?
                    .map(|n| n.max(0) as u64),
            }
        }
        CollectionMethod::FindOne => Operation::FindOne {
            filter: filter_arg(&args, 0)?,
            projection: optional_document(&args, 1, "projection")?,
            collection,
        },
        CollectionMethod::CountDocuments => Operation::CountDocuments {
            filter: filter_arg(&args, 0)?,
            collection,
        },
        CollectionMethod::Distinct => Operation::Distinct {
            field: required_name(&args, 0, "distinct", "field name")?,
            filter: filter_arg(&args, 1)?,
            collection,
        },
        CollectionMethod::GetIndexes => Operation::GetIndexes { collection },
        CollectionMethod::Stats => Operation::CollectionStats { collection },
        CollectionMethod::Drop => Operation::DropCollection { collection },
        CollectionMethod::InsertOne => Operation::InsertOne {
            document: required_document(&args, 0, "insertOne", "document")?,
            collection,
        },
        CollectionMethod::Insert => {
            let text = required_arg(&args, 0, "insert", "document")?;
            let documents = match parse_json(text, "document")? {
                Bson::Array(_) => parse_document_list(text, "documents")?,
                Bson::Document(doc) => vec![doc],
                _ => return Err(invalid_json("document", "expected an object or an array")),
            };
            Operation::InsertMany {
                collection,
                documents,
            }
        }
        CollectionMethod::InsertMany => Operation::InsertMany {
            documents: parse_document_list(
                required_arg(&args, 0, "insertMany", "documents")?,
                "documents",
            )?,
            collection,
        },
        CollectionMethod::UpdateOne | CollectionMethod::UpdateMany => {
            let filter = required_document(&args, 0, method.name(), "filter")?;
            let update = parse_update(required_arg(&args, 1, method.name(), "update")?)?;
            if method == CollectionMethod::UpdateOne {
                Operation::UpdateOne {
                    collection,
                    filter,
                    update,
                }
            } else {
                Operation::UpdateMany {
                    collection,
                    filter,
                    update,
                }
            }
        }
        CollectionMethod::DeleteOne => Operation::DeleteOne {
            filter: required_document(&args, 0, "deleteOne", "filter")?,
            collection,
        },
        CollectionMethod::DeleteMany => Operation::DeleteMany {
            filter: required_document(&args, 0, "deleteMany", "filter")?,
            collection,
        },
        CollectionMethod::Aggregate => Operation::Aggregate {
            pipeline: match args.first() {
                Some(text) => parse_document_list(text, "pipeline")?,
                None => Vec::new(),
            },
            collection,
        },
        CollectionMethod::CreateIndex => {
            let keys = required_document(&args, 0, "createIndex", "index key")?;
            let options = optional_document(&args, 1, "index options")?;
            if let Some(doc) = &options {
                bson::from_document::<IndexOptions>(doc.clone())
                    .map_err(|e| invalid_json("index options", e))?;
            }
            Operation::CreateIndex {
                collection,
                keys,
                options,
            }
        }
        CollectionMethod::DropIndex => Operation::DropIndex {
            name: required_name(&args, 0, "dropIndex", "index name")?,
            collection,
        },
    };

    Ok(operation)
}

fn invalid_json(kind: &str, message: impl ToString) -> ParseError {
    ParseError::InvalidJson {
        kind: kind.to_string(),
        message: message.to_string(),
    }
}

fn parse_json(text: &str, kind: &str) -> PlanResult<Bson> {
    let value: JsonValue = serde_json::from_str(text).map_err(|e| invalid_json(kind, e))?;
    Ok(codec::decode(&value))
}

fn parse_document(text: &str, kind: &str) -> PlanResult<Document> {
    match parse_json(text, kind)? {
        Bson::Document(doc) => Ok(doc),
        _ => Err(invalid_json(kind, "expected an object")),
    }
}

fn parse_document_list(text: &str, kind: &str) -> PlanResult<Vec<Document>> {
    let Bson::Array(items) = parse_json(text, kind)? else {
        return Err(invalid_json(kind, "expected an array"));
    };

    items
        .into_iter()
        .map(|item| match item {
            Bson::Document(doc) => Ok(doc),
            _ => Err(invalid_json(kind, "expected an array of objects")),
        })
        .collect()
}

fn parse_integer(text: &str, kind: &str) -> PlanResult<i64> {
    match serde_json::from_str::<JsonValue>(text).map_err(|e| invalid_json(kind, e))? {
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| invalid_json(kind, "expected an integer")),
        _ => Err(invalid_json(kind, "expected an integer")),
    }
}

fn parse_update(text: &str) -> PlanResult<UpdateSpec> {
    match parse_json(text, "update")? {
        Bson::Document(doc) => Ok(UpdateSpec::Document(doc)),
        Bson::Array(_) => parse_document_list(text, "update").map(UpdateSpec::Pipeline),
        _ => Err(invalid_json("update", "expected an object or a pipeline array")),
    }
}

/// Filter at `index`, empty when absent.
fn filter_arg(args: &[String], index: usize) -> PlanResult<Document> {
    Ok(optional_document(args, index, "filter")?.unwrap_or_default())
}

fn optional_document(args: &[String], index: usize, kind: &str) -> PlanResult<Option<Document>> {
    args.get(index)
        .map(|text| parse_document(text, kind))
        .transpose()
}

fn required_arg<'a>(args: &'a [String], index: usize, method: &str, what: &str) -> PlanResult<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| ParseError::InvalidArgument(format!("missing {what} argument for {method}")))
}

fn required_document(args: &[String], index: usize, method: &str, kind: &str) -> PlanResult<Document> {
    parse_document(required_arg(args, index, method, kind)?, kind)
}

fn required_name(args: &[String], index: usize, method: &str, what: &str) -> PlanResult<String> {
    let text = required_arg(args, index, method, what)?;
    unquote(text)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ParseError::InvalidArgument(format!("{method} expects a quoted {what}, got {text}"))
        })
}
