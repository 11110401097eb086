use anyhow::Context;
use askama::Template;

use super::{render_template, single_line};
use crate::format::SourceFormatter;
use crate::model::{DocumentMode, EntityModel, FieldDescriptor};
use crate::naming::{replace_initialisms, to_lower_camel};
use crate::types::Scalar;

/// File names of the aggregated gists, in write order.
pub const CONVERT_API_OUT: &str = "convert-api.txt";
pub const CONVERT_RPC_OUT: &str = "convert-rpc.txt";
pub const UPDATE_MAP_OUT: &str = "update-map.txt";
pub const FILTER_OUT: &str = "filter.txt";

/// How a storage model member becomes an API member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    /// Plain assignment in the literal.
    Direct,
    /// `*time.Time` to unix milliseconds.
    Time,
    /// `gorm.DeletedAt` to unix milliseconds.
    DeletedAt,
    /// Pointer dereferenced when set.
    Deref,
    /// `datatypes.JSON` unmarshalled into a map.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertField {
    /// API member name
    pub name: String,
    /// Storage member name
    pub source: String,
    pub kind: ConversionKind,
    /// Zero value of the API member
    pub empty: String,
}

impl ConvertField {
    /// Value of the member in the struct literal.
    pub fn initial_value(&self) -> String {
        match self.kind {
            ConversionKind::Direct => format!("src.{}", self.source),
            _ => self.empty.clone(),
        }
    }
}

/// Template data for a storage-to-API conversion function
#[derive(Template)]
#[template(path = "convert.go.txt", escape = "none")]
pub struct ConvertTemplate {
    pub model_name: String,
    pub storage_name: String,
    /// Target package (`types` or `pb`)
    pub package: String,
    /// Function name suffix (`API` or `RPC`)
    pub suffix: String,
    pub fields: Vec<ConvertField>,
}

/// How a request member is read in update maps and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    Pointer,
    /// Pointer to unix milliseconds
    PointerTime,
    Value,
    /// Unix milliseconds
    Time,
    Json,
}

impl FieldAccess {
    fn of(field: &FieldDescriptor, mode: DocumentMode) -> Self {
        let pointer = field.type_in(mode).is_pointer();
        match (field.is_json(), field.is_time_field(), pointer) {
            (true, _, _) => FieldAccess::Json,
            (false, true, true) => FieldAccess::PointerTime,
            (false, true, false) => FieldAccess::Time,
            (false, false, true) => FieldAccess::Pointer,
            (false, false, false) => FieldAccess::Value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateField {
    pub name: String,
    pub raw_name: String,
    pub access: FieldAccess,
    /// Local variable holding marshalled JSON
    pub var_name: String,
}

/// Template data for the update-map builder
#[derive(Template)]
#[template(path = "update_map.go.txt", escape = "none")]
pub struct UpdateMapTemplate {
    pub title: String,
    pub fields: Vec<UpdateField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterField {
    pub name: String,
    pub raw_name: String,
    pub access: FieldAccess,
    /// Zero value compared against for value access
    pub empty: String,
}

/// Template data for the gorm filter builder
#[derive(Template)]
#[template(path = "filter.go.txt", escape = "none")]
pub struct FilterTemplate {
    pub title: String,
    pub model_name: String,
    pub label: String,
    pub fields: Vec<FilterField>,
}

/// The gist fragments of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gists {
    pub convert_api: String,
    pub convert_rpc: String,
    pub update_map: String,
    pub filter: String,
}

/// Gist fragments accumulated across tables.
#[derive(Debug, Clone, Default)]
pub struct GistSet {
    convert_api: Vec<String>,
    convert_rpc: Vec<String>,
    update_map: Vec<String>,
    filter: Vec<String>,
}

impl GistSet {
    pub fn push(&mut self, gists: Gists) {
        self.convert_api.push(gists.convert_api);
        self.convert_rpc.push(gists.convert_rpc);
        self.update_map.push(gists.update_map);
        self.filter.push(gists.filter);
    }

    pub fn is_empty(&self) -> bool {
        self.convert_api.is_empty()
    }

    /// File name and content of every gist file, fragments separated by a blank line.
    pub fn files(&self) -> Vec<(&'static str, String)> {
        if self.is_empty() {
            return Vec::new();
        }
        vec![
            (CONVERT_API_OUT, self.convert_api.join("\n\n")),
            (CONVERT_RPC_OUT, self.convert_rpc.join("\n\n")),
            (UPDATE_MAP_OUT, self.update_map.join("\n\n")),
            (FILTER_OUT, self.filter.join("\n\n")),
        ]
    }
}

fn convert_fields(entity: &EntityModel, storage: &[FieldDescriptor]) -> Vec<ConvertField> {
    entity
        .fields
        .iter()
        .zip(storage)
        .map(|(api, store)| {
            let kind = if api.is_json() {
                ConversionKind::Json
            } else if store.ty.is(Scalar::DeletedAt) {
                ConversionKind::DeletedAt
            } else if store.ty.is_time() {
                ConversionKind::Time
            } else if store.ty.is_pointer() {
                ConversionKind::Deref
            } else {
                ConversionKind::Direct
            };
            ConvertField {
                name: api.name.clone(),
                source: store.name.clone(),
                kind,
                empty: api.ty.empty_literal().to_string(),
            }
        })
        .collect()
}

fn format_gist(formatter: &dyn SourceFormatter, raw: &str, name: &str) -> anyhow::Result<String> {
    let formatted = formatter
        .format_source(raw)
        .map_err(|e| e.context(format!("Failed to format {name} gist\n{raw}")))?;
    Ok(formatted.trim_end().to_string())
}

/// Render the gist fragments of one entity.
///
/// `storage` is the storage view of the same columns, in the same order as
/// `entity.fields`.
pub fn render_gists(
    entity: &EntityModel,
    storage: &[FieldDescriptor],
    formatter: &dyn SourceFormatter,
) -> anyhow::Result<Gists> {
    if entity.fields.len() != storage.len() {
        anyhow::bail!(
            "storage view of `{}` has {} fields, expected {}",
            entity.table,
            storage.len(),
            entity.fields.len()
        );
    }
    let title = single_line(&format!("{} {}", entity.struct_name, entity.table_comment));
    let storage_name = replace_initialisms(&entity.struct_name);
    let fields = convert_fields(entity, storage);

    let convert = |package: &str, suffix: &str| ConvertTemplate {
        model_name: entity.model_name.clone(),
        storage_name: storage_name.clone(),
        package: package.to_string(),
        suffix: suffix.to_string(),
        fields: fields.clone(),
    };
    let update_map = UpdateMapTemplate {
        title: title.clone(),
        fields: entity
            .fields_in(DocumentMode::Update)
            .filter(|f| !f.primary_key)
            .map(|f| UpdateField {
                name: f.name.clone(),
                raw_name: f.raw_name.clone(),
                access: FieldAccess::of(f, DocumentMode::Update),
                var_name: to_lower_camel(&f.name),
            })
            .collect(),
    };
    let filter = FilterTemplate {
        title,
        model_name: entity.model_name.clone(),
        label: crate::annotation::label_of(&single_line(&entity.table_comment)),
        fields: entity
            .fields_in(DocumentMode::Filter)
            .map(|f| FilterField {
                name: f.name.clone(),
                raw_name: f.raw_name.clone(),
                access: FieldAccess::of(f, DocumentMode::Filter),
                empty: f.type_in(DocumentMode::Filter).empty_literal().to_string(),
            })
            .collect(),
    };

    let render = |raw: anyhow::Result<String>, name: &str| -> anyhow::Result<String> {
        format_gist(formatter, &raw?, name).with_context(|| format!("Failed to build gists of `{}`", entity.table))
    };
    Ok(Gists {
        convert_api: render(render_template(&convert("types", "API"), "convert.go.txt"), "convert-api")?,
        convert_rpc: render(render_template(&convert("pb", "RPC"), "convert.go.txt"), "convert-rpc")?,
        update_map: render(render_template(&update_map, "update_map.go.txt"), "update-map")?,
        filter: render(render_template(&filter, "filter.go.txt"), "filter")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDescriptor, TableMetadata};
    use crate::config::ApiConfig;
    use crate::format::Verbatim;
    use crate::model::{build_entity, build_fields, storage_fields};
    use pretty_assertions::assert_eq;

    fn column(name: &str, ordinal: u32, data_type: &str, comment: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            ordinal,
            data_type: data_type.to_string(),
            column_type: data_type.to_string(),
            comment: comment.to_string(),
            ..ColumnDescriptor::default()
        }
    }

    fn fixture() -> (EntityModel, Vec<FieldDescriptor>) {
        let mut id = column("id", 1, "bigint", "ID");
        id.primary_key = true;
        let mut nickname = column("nickname", 3, "varchar", "昵称");
        nickname.default = "guest".to_string();
        let mut login_at = column("login_at", 5, "datetime", "登录时间");
        login_at.nullable = true;
        let mut created_at = column("created_at", 6, "datetime", "创建时间");
        created_at.default = "CURRENT_TIMESTAMP".to_string();
        let table = TableMetadata {
            name: "user".to_string(),
            comment: "用户".to_string(),
            columns: vec![
                id,
                column("name", 2, "varchar", "名称"),
                nickname,
                column("extra", 4, "json", "扩展"),
                login_at,
                created_at,
                column("deleted_at", 7, "datetime", "删除时间"),
            ],
            ..TableMetadata::default()
        };
        let api = ApiConfig {
            enable_initialism: true,
            ..ApiConfig::default()
        };
        let config = api.generation_config(&Default::default());
        let entity = build_entity(&table, &config, &api).unwrap();
        let storage = storage_fields(&build_fields(&table.columns, &config).unwrap());
        (entity, storage)
    }

    #[test]
    fn test_conversion_kinds() {
        let (entity, storage) = fixture();
        let kinds: Vec<_> = convert_fields(&entity, &storage)
            .into_iter()
            .map(|f| (f.name.clone(), f.kind, f.initial_value()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("ID".to_string(), ConversionKind::Direct, "src.ID".to_string()),
                ("Name".to_string(), ConversionKind::Direct, "src.Name".to_string()),
                ("Nickname".to_string(), ConversionKind::Deref, "\"\"".to_string()),
                ("Extra".to_string(), ConversionKind::Json, "nil".to_string()),
                ("LoginAt".to_string(), ConversionKind::Time, "0".to_string()),
                ("CreatedAt".to_string(), ConversionKind::Time, "0".to_string()),
                ("DeletedAt".to_string(), ConversionKind::DeletedAt, "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_convert_gist() {
        let (entity, storage) = fixture();
        let gists = render_gists(&entity, &storage, &Verbatim).unwrap();

        assert!(gists
            .convert_rpc
            .starts_with("// ConvertUserToRPC 将 model.User 转换为 pb.User\nfunc ConvertUserToRPC(src *model.User) *pb.User {\n"));
        assert!(gists.convert_api.contains("func ConvertUserToAPI(src *model.User) *types.User {"));
        assert!(gists.convert_api.contains("\t\tID: src.ID,\n\t\tName: src.Name,\n\t\tNickname: \"\",\n"));
        assert!(gists
            .convert_api
            .contains("\tif src.LoginAt != nil {\n\t\tdst.LoginAt = src.LoginAt.UnixMilli()\n\t}\n"));
        assert!(gists
            .convert_api
            .contains("\tif src.DeletedAt.Valid {\n\t\tdst.DeletedAt = src.DeletedAt.Time.UnixMilli()\n\t}\n"));
        assert!(gists
            .convert_api
            .contains("\tif len(src.Extra) > 0 {\n\t\t_ = json.Unmarshal(src.Extra, &dst.Extra)\n\t}\n"));
        assert!(gists.convert_api.ends_with("\n\treturn dst\n}"));
    }

    #[test]
    fn test_update_map_gist() {
        let (entity, storage) = fixture();
        let gists = render_gists(&entity, &storage, &Verbatim).unwrap();
        let doc = &gists.update_map;

        assert!(doc.starts_with(
            "// ---------------------- User 用户 ---------------------- //\n// 构建更新map\nupdateMap := make(map[string]interface{})\n"
        ));
        assert!(!doc.contains("updateMap[\"id\"]"));
        assert!(!doc.contains("created_at"));
        assert!(doc.contains("\nupdateMap[\"name\"] = req.Name\n"));
        assert!(doc.contains("if req.Nickname != nil {\n\tupdateMap[\"nickname\"] = *req.Nickname\n}"));
        assert!(doc.contains("if req.LoginAt != nil {\n\tupdateMap[\"login_at\"] = time.UnixMilli(*req.LoginAt)\n}"));
        assert!(doc.contains("\textra, err := json.Marshal(req.Extra)\n"));
        assert!(doc.contains("updateMap[\"deleted_at\"] = time.UnixMilli(req.DeletedAt)"));
    }

    #[test]
    fn test_unguarded_update_members_are_required() {
        let (entity, storage) = fixture();
        let gists = render_gists(&entity, &storage, &Verbatim).unwrap();

        for field in entity.fields_in(DocumentMode::Update).filter(|f| !f.primary_key) {
            let member = crate::document::api_field(field, DocumentMode::Update);
            match FieldAccess::of(field, DocumentMode::Update) {
                FieldAccess::Value | FieldAccess::Time => {
                    assert!(member.tag.contains("validate:\"required"), "{member}");
                    assert!(!member.tag.contains(",optional"), "{member}");
                    assert!(gists
                        .update_map
                        .contains(&format!("updateMap[\"{}\"] = ", field.raw_name)));
                }
                FieldAccess::Pointer | FieldAccess::PointerTime => {
                    assert!(member.ty.starts_with('*'), "{member}");
                    assert!(gists.update_map.contains(&format!("if req.{} != nil {{", field.name)));
                }
                FieldAccess::Json => {}
            }
        }

        let name = entity.fields.iter().find(|f| f.raw_name == "name").unwrap();
        assert_eq!(
            crate::document::api_field(name, DocumentMode::Update).tag,
            "`json:\"name\" validate:\"required\" label:\"名称\"`"
        );
        assert!(gists.update_map.contains("\nupdateMap[\"name\"] = req.Name\n"));
    }

    #[test]
    fn test_filter_gist() {
        let (entity, storage) = fixture();
        let gists = render_gists(&entity, &storage, &Verbatim).unwrap();
        let doc = &gists.filter;

        assert!(doc.starts_with(
            "// ---------------------- User 用户 ---------------------- //\n// FilterUser 构建用户筛选条件\nfunc FilterUser(db *gorm.DB, req *types.FilterUserReq) *gorm.DB {\n"
        ));
        assert!(doc.contains("\tif req.Name != \"\" {\n\t\tdb = db.Where(\"name = ?\", req.Name)\n\t}\n"));
        assert!(doc.contains("\tif req.CreatedAt != 0 {\n\t\tdb = db.Where(\"created_at = ?\", time.UnixMilli(req.CreatedAt))\n\t}\n"));
        assert!(doc.contains("\tif req.LoginAt != nil {\n"));
        assert!(!doc.contains("req.Extra"));
        assert!(!doc.contains("req.ID"));
        assert!(doc.ends_with("\n\treturn db\n}"));
    }

    #[test]
    fn test_gist_set_joins_tables() {
        let mut set = GistSet::default();
        assert!(set.files().is_empty());
        let gists = |s: &str| Gists {
            convert_api: format!("api {s}"),
            convert_rpc: format!("rpc {s}"),
            update_map: format!("map {s}"),
            filter: format!("filter {s}"),
        };
        set.push(gists("a"));
        set.push(gists("b"));
        let files = set.files();
        assert_eq!(files[0], (CONVERT_API_OUT, "api a\n\napi b".to_string()));
        assert_eq!(files[3], (FILTER_OUT, "filter a\n\nfilter b".to_string()));
    }

    #[test]
    fn test_mismatched_storage_view_is_rejected() {
        let (entity, mut storage) = fixture();
        storage.pop();
        assert!(render_gists(&entity, &storage, &Verbatim).is_err());
    }
}
