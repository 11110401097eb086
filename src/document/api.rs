use anyhow::Context;
use askama::Template;
use std::fmt;

use super::{quoted, render_template, single_line};
use crate::config::ApiConfig;
use crate::format::{format_api, RouteValidator, SourceFormatter};
use crate::model::{DocumentMode, EntityModel, FieldDescriptor};

/// One member line of a route type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiField {
    pub name: String,
    pub ty: String,
    /// Tag including backticks
    pub tag: String,
    pub comment: String,
}

impl fmt::Display for ApiField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.ty, self.tag)?;
        if !self.comment.is_empty() {
            write!(f, " // {}", self.comment)?;
        }
        Ok(())
    }
}

/// Primary key as rendered into path and batch parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdView {
    pub name: String,
    pub name_plural: String,
    pub ty: String,
    pub raw_name: String,
    pub raw_name_plural: String,
    pub comment: String,
    pub label: String,
}

/// Template data for a per-table route file
#[derive(Template)]
#[template(path = "api.api.txt", escape = "none")]
pub struct ApiTemplate {
    pub model_name: String,
    /// Table comment
    pub label: String,
    /// Name used in `@doc` strings: the table comment label, or the model name
    pub doc_label: String,
    pub object_name: String,
    pub id: Option<IdView>,
    pub model_fields: Vec<ApiField>,
    pub create_fields: Vec<ApiField>,
    pub update_fields: Vec<ApiField>,
    pub batch_update_fields: Vec<ApiField>,
    pub list_fields: Vec<ApiField>,
    pub filter_fields: Vec<ApiField>,
    /// `@server` prefix (`/api/v1`), empty for none
    pub prefix: String,
    pub group_name: String,
    pub service_name: String,
    pub route_name: String,
    pub list_route_name: String,
}

/// Template data for the aggregate route file
#[derive(Template)]
#[template(path = "server.api.txt", escape = "none")]
pub struct ServerApiTemplate {
    pub title: String,
    pub desc: String,
    pub author: String,
    pub email: String,
    pub version: String,
    /// Per-table route files to import
    pub imports: Vec<String>,
}

/// Tag of a field in `mode`.
///
/// | mode | key | optional | validation |
/// |------|-----|----------|------------|
/// | model | `json` | never | none |
/// | create, update, batch update | `json` | nullable or defaulted | `required[,oneof]` or `omitempty,oneof` |
/// | get | `form` | always | `omitempty,oneof` |
/// | filter | `json` | always | `omitempty,oneof` |
///
/// The primary key of a single update travels as a path parameter.
fn api_tag(field: &FieldDescriptor, mode: DocumentMode) -> String {
    if mode == DocumentMode::Model {
        return format!("`json:\"{}\"`", field.raw_name);
    }
    if mode == DocumentMode::Update && field.primary_key {
        return format!("`path:\"{}\" swaggerignore:\"true\"`", field.raw_name);
    }

    let key = if mode == DocumentMode::Get { "form" } else { "json" };
    let required = mode.is_write() && field.is_required();
    let mut parts = vec![if required {
        format!("{key}:\"{}\"", field.raw_name)
    } else {
        format!("{key}:\"{},optional\"", field.raw_name)
    }];
    match (required, field.enums.is_empty()) {
        (true, true) => parts.push("validate:\"required\"".to_string()),
        (true, false) => parts.push(format!("validate:\"required,oneof={}\"", field.enums)),
        (false, false) => parts.push(format!("validate:\"omitempty,oneof={}\"", field.enums)),
        (false, true) => {}
    }
    if !field.label.is_empty() {
        parts.push(format!("label:\"{}\"", quoted(&field.label)));
    }
    format!("`{}`", parts.join(" "))
}

/// Member line of a field in `mode`.
pub fn api_field(field: &FieldDescriptor, mode: DocumentMode) -> ApiField {
    ApiField {
        name: field.name.clone(),
        ty: field.type_in(mode).to_string(),
        tag: api_tag(field, mode),
        comment: single_line(&field.comment),
    }
}

fn api_fields(entity: &EntityModel, mode: DocumentMode) -> Vec<ApiField> {
    entity.fields_in(mode).map(|f| api_field(f, mode)).collect()
}

/// `/route_prefix/group_prefix` with empty segments dropped.
fn server_prefix(api: &ApiConfig) -> String {
    [api.route_prefix.as_str(), api.group_prefix.as_str()]
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .map(|s| format!("/{s}"))
        .collect()
}

impl ApiTemplate {
    pub fn new(entity: &EntityModel, api: &ApiConfig) -> Self {
        let label = single_line(&entity.table_comment);
        let doc_label = match crate::annotation::label_of(&label) {
            l if l.is_empty() => entity.model_name.clone(),
            l => quoted(&l),
        };
        let id = entity.id.as_ref().map(|id| IdView {
            name: id.name.clone(),
            name_plural: id.name_plural.clone(),
            ty: id.ty.to_string(),
            raw_name: id.raw_name.clone(),
            raw_name_plural: id.raw_name_plural.clone(),
            comment: single_line(&id.comment),
            label: quoted(&id.label),
        });

        Self {
            model_name: entity.model_name.clone(),
            label,
            doc_label,
            object_name: entity.object_name.clone(),
            id,
            model_fields: api_fields(entity, DocumentMode::Model),
            create_fields: api_fields(entity, DocumentMode::Create),
            update_fields: api_fields(entity, DocumentMode::Update),
            batch_update_fields: api_fields(entity, DocumentMode::BatchUpdate),
            list_fields: api_fields(entity, DocumentMode::Get),
            filter_fields: api_fields(entity, DocumentMode::Filter),
            prefix: server_prefix(api),
            group_name: entity.group_name.clone(),
            service_name: api.service_name.clone(),
            route_name: entity.route_name.clone(),
            list_route_name: entity.list_route_name.clone(),
        }
    }
}

/// Render, validate and post-format the route file of one entity.
pub fn render_api(
    entity: &EntityModel,
    api: &ApiConfig,
    validator: &dyn RouteValidator,
    formatter: &dyn SourceFormatter,
) -> anyhow::Result<String> {
    let raw = render_template(&ApiTemplate::new(entity, api), "api.api.txt")?;
    format_api(&raw, validator, formatter).with_context(|| format!("Failed to format route file of `{}`", entity.table))
}

/// Render, validate and post-format the aggregate route file.
pub fn render_server_api(
    api: &ApiConfig,
    imports: &[String],
    validator: &dyn RouteValidator,
    formatter: &dyn SourceFormatter,
) -> anyhow::Result<String> {
    let template = ServerApiTemplate {
        title: quoted(&api.title),
        desc: quoted(&api.desc),
        author: quoted(&api.author),
        email: quoted(&api.email),
        version: quoted(&api.version),
        imports: imports.to_vec(),
    };
    let raw = render_template(&template, "server.api.txt")?;
    format_api(&raw, validator, formatter).context("Failed to format aggregate route file")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDescriptor, TableIndexes, TableMetadata};
    use crate::format::{DelimiterValidator, Verbatim};
    use crate::model::build_entity;

    fn column(name: &str, ordinal: u32, data_type: &str, column_type: &str, comment: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            ordinal,
            data_type: data_type.to_string(),
            column_type: column_type.to_string(),
            unsigned: column_type.contains("unsigned"),
            comment: comment.to_string(),
            ..ColumnDescriptor::default()
        }
    }

    fn entity(api: &ApiConfig) -> EntityModel {
        let mut id = column("id", 1, "bigint", "bigint(20) unsigned", "用户id");
        id.primary_key = true;
        id.auto_increment = true;
        let mut nickname = column("nickname", 3, "varchar", "varchar(64)", "昵称");
        nickname.nullable = true;
        let mut created_at = column("created_at", 5, "datetime", "datetime", "创建时间");
        created_at.default = "CURRENT_TIMESTAMP".to_string();
        let table = TableMetadata {
            name: "user".to_string(),
            comment: "用户".to_string(),
            columns: vec![
                id,
                column("user_name", 2, "varchar", "varchar(255)", "用户名称"),
                nickname,
                column("status", 4, "tinyint", "tinyint(4)", "状态（1 正常 2 禁用）"),
                created_at,
            ],
            indexes: TableIndexes::default(),
        };
        let config = api.generation_config(&Default::default());
        build_entity(&table, &config, api).unwrap()
    }

    fn api_config() -> ApiConfig {
        ApiConfig {
            enable_initialism: true,
            enable_plural: true,
            service_name: "user-api".to_string(),
            route_prefix: "api".to_string(),
            group_prefix: "/v1/".to_string(),
            ..ApiConfig::default()
        }
    }

    fn field_by_raw<'a>(entity: &'a EntityModel, raw: &str) -> &'a FieldDescriptor {
        entity.fields.iter().find(|f| f.raw_name == raw).unwrap()
    }

    #[test]
    fn test_tags_per_mode() {
        let entity = entity(&api_config());
        let user_name = field_by_raw(&entity, "user_name");
        assert_eq!(
            api_field(user_name, DocumentMode::Create).to_string(),
            "UserName string `json:\"user_name\" validate:\"required\" label:\"用户名称\"` // 用户名称"
        );
        assert_eq!(
            api_field(user_name, DocumentMode::Update).to_string(),
            "UserName string `json:\"user_name\" validate:\"required\" label:\"用户名称\"` // 用户名称"
        );
        assert_eq!(
            api_field(user_name, DocumentMode::BatchUpdate).tag,
            "`json:\"user_name\" validate:\"required\" label:\"用户名称\"`"
        );
        assert_eq!(
            api_field(user_name, DocumentMode::Get).tag,
            "`form:\"user_name,optional\" label:\"用户名称\"`"
        );
        assert_eq!(api_field(user_name, DocumentMode::Model).tag, "`json:\"user_name\"`");

        let status = field_by_raw(&entity, "status");
        let create = api_field(status, DocumentMode::Create);
        assert_eq!(create.ty, "*int32");
        assert_eq!(create.tag, "`json:\"status\" validate:\"required,oneof=1 2\" label:\"状态\"`");
        assert_eq!(
            api_field(status, DocumentMode::Filter).tag,
            "`json:\"status,optional\" validate:\"omitempty,oneof=1 2\" label:\"状态\"`"
        );

        let nickname = field_by_raw(&entity, "nickname");
        let create = api_field(nickname, DocumentMode::Create);
        assert_eq!(create.ty, "*string");
        assert_eq!(create.tag, "`json:\"nickname,optional\" label:\"昵称\"`");

        let id = field_by_raw(&entity, "id");
        let update = api_field(id, DocumentMode::Update);
        assert_eq!(update.ty, "int64");
        assert_eq!(update.tag, "`path:\"id\" swaggerignore:\"true\"`");
    }

    #[test]
    fn test_template_sections() {
        let api = api_config();
        let template = ApiTemplate::new(&entity(&api), &api);
        let names = |fields: &[ApiField]| fields.iter().map(|f| f.name.clone()).collect::<Vec<_>>();

        assert_eq!(template.prefix, "/api/v1");
        assert_eq!(template.doc_label, "用户");
        assert_eq!(names(&template.model_fields), ["ID", "UserName", "Nickname", "Status", "CreatedAt"]);
        assert_eq!(names(&template.create_fields), ["UserName", "Nickname", "Status"]);
        assert_eq!(names(&template.update_fields), ["ID", "UserName", "Nickname", "Status"]);
        assert_eq!(names(&template.batch_update_fields), ["UserName", "Nickname", "Status"]);
        assert_eq!(names(&template.list_fields), ["UserName", "Nickname", "Status", "CreatedAt"]);
        assert_eq!(template.model_fields[4].ty, "int64");
        let id = template.id.as_ref().unwrap();
        assert_eq!((id.name_plural.as_str(), id.raw_name_plural.as_str()), ("IDs", "ids"));
    }

    #[test]
    fn test_rendered_route_file() {
        let api = api_config();
        let doc = render_api(&entity(&api), &api, &DelimiterValidator, &Verbatim).unwrap();

        assert!(doc.starts_with("syntax = \"v1\"\n\n// User 用户\ntype User {\n"));
        assert!(doc.contains("\tCreateUserReq {\n"));
        assert!(doc.contains("\tUpdateUserResp {}\n"));
        assert!(doc.contains("IDs []int64 `json:\"ids\" validate:\"required\" label:\"用户id\"` // 用户id"));
        assert!(doc.contains("@server (\n\tprefix: /api/v1\n\tgroup: user\n)\nservice user-api {\n"));
        assert!(doc.contains("\tpost /user (CreateUserReq) returns (CreateUserResp)\n"));
        assert!(doc.contains("\tput /user/:id (UpdateUserReq) returns (UpdateUserResp)\n"));
        assert!(doc.contains("\tget /users (GetUserListReq) returns (GetUserListResp)\n"));
        assert!(doc.contains("\tpost /users/filter (FilterUserReq) returns (FilterUserResp)\n"));
        assert!(!doc.contains(" struct "));
        assert!(doc.ends_with('}'));
        assert!(DelimiterValidator.validate(&doc).is_ok());
    }

    #[test]
    fn test_entity_without_id_skips_id_routes() {
        let api = api_config();
        let mut entity = entity(&api);
        entity.id = None;
        for field in &mut entity.fields {
            field.primary_key = false;
        }
        let doc = render_api(&entity, &api, &DelimiterValidator, &Verbatim).unwrap();
        assert!(!doc.contains("UpdateUserReq"));
        assert!(!doc.contains("/:id"));
        assert!(doc.contains("GetUserListReq"));
    }

    #[test]
    fn test_server_file() {
        let api = ApiConfig {
            title: "用户服务".to_string(),
            version: "v1.0.0".to_string(),
            ..api_config()
        };
        let imports = vec!["user.api".to_string(), "role.api".to_string()];
        let doc = render_server_api(&api, &imports, &DelimiterValidator, &Verbatim).unwrap();
        assert_eq!(
            doc,
            "syntax = \"v1\"\n\ninfo (\n\ttitle: \"用户服务\"\n\tdesc: \"\"\n\tauthor: \"\"\n\temail: \"\"\n\tversion: \"v1.0.0\"\n)\n\nimport \"user.api\"\nimport \"role.api\""
        );
    }
}
