use grom::catalog::SnapshotCatalog;
use grom::config::{ApiConfig, DbConfig, ProjectConfig, RouteStyle};
use grom::format::{ApiFormatError, DelimiterValidator, Gofmt, Verbatim};
use grom::project::generate_project;
use std::fs;
use std::path::Path;

fn catalog() -> SnapshotCatalog {
    SnapshotCatalog::load(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/catalog.yaml")).unwrap()
}

fn project(dir: &Path) -> ProjectConfig {
    ProjectConfig {
        db: DbConfig::default(),
        api: ApiConfig {
            enable_initialism: true,
            title: "后台服务".to_string(),
            version: "v1.0.0".to_string(),
            service_name: "admin-api".to_string(),
            route_prefix: "api".to_string(),
            group_prefix: "v1".to_string(),
            route_style: RouteStyle::Kebab,
            enable_plural: true,
            enable_model: true,
            ..ApiConfig::default()
        },
        dir: dir.to_path_buf(),
        table_prefix: "t_".to_string(),
        tables: vec!["t_user".to_string(), "t_role".to_string(), "t_empty".to_string()],
        enable_trim_table_prefix: true,
    }
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap_or_else(|e| panic!("{file}: {e}"))
}

#[test]
fn test_generates_every_project_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = project(dir.path());
    let report = generate_project(&mut catalog(), &config, &Verbatim, &DelimiterValidator).unwrap();

    assert_eq!(report.skipped, vec!["t_empty".to_string()]);
    let written: Vec<String> = report
        .written
        .iter()
        .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(
        written,
        vec![
            "user.api",
            "model/t_user.go",
            "role.api",
            "model/t_role.go",
            "t.api",
            "convert-api.txt",
            "convert-rpc.txt",
            "update-map.txt",
            "filter.txt",
        ]
    );
}

#[test]
fn test_route_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    generate_project(&mut catalog(), &project(dir.path()), &Verbatim, &DelimiterValidator).unwrap();
    let api = read(dir.path(), "user.api");

    assert!(api.starts_with("syntax = \"v1\"\n\n// User 用户\ntype User {\n"));
    assert!(api.contains("\nIsAdmin bool `json:\"is_admin\"` // 是否管理员\n"));
    assert!(api.contains("\nCreatedAt int64 `json:\"created_at\"` // 创建时间\n"));
    assert!(api.contains(
        "\nStatus *int32 `json:\"status,optional\" validate:\"omitempty,oneof=1 2\" label:\"状态\"` // 状态（1 正常 2 禁用）\n"
    ));
    assert!(api.contains("\nUserName string `json:\"user_name\" validate:\"required\" label:\"用户名称\"` // 用户名称\n"));
    assert!(api.contains("@server (\n\tprefix: /api/v1\n\tgroup: user\n)\nservice admin-api {\n"));
    assert!(api.contains("\t@doc \"获取用户列表\"\n\t@handler GetUserList\n\tget /users (GetUserListReq) returns (GetUserListResp)\n"));
    assert!(api.contains("\tdelete /users/batch (BatchDeleteUserReq) returns (BatchDeleteUserResp)\n"));
    assert!(api.ends_with("}"));

    let server = read(dir.path(), "t.api");
    assert!(server.contains("\ttitle: \"后台服务\"\n"));
    assert!(server.ends_with("import \"user.api\"\nimport \"role.api\""));
}

#[test]
fn test_storage_model_contents() {
    let dir = tempfile::tempdir().unwrap();
    generate_project(&mut catalog(), &project(dir.path()), &Verbatim, &DelimiterValidator).unwrap();
    let model = read(dir.path(), "model/t_user.go");

    assert!(model.starts_with(
        "package model\n\nimport (\n\t\"gorm.io/datatypes\"\n\t\"gorm.io/gorm\"\n\t\"time\"\n)\n\n// User 用户\ntype User struct {\n"
    ));
    assert!(model.contains("\tID int64 `json:\"id\" gorm:\"primaryKey;autoIncrement;column:id;comment:用户id\"` // 用户id\n"));
    assert!(model.contains("\tStatus *int32 `json:\"status\""));
    assert!(model.contains("\tExtra datatypes.JSON `json:\"extra\""));
    assert!(model.contains("\tCreatedAt *time.Time `json:\"created_at\""));
    assert!(model.contains(
        "\tDeletedAt gorm.DeletedAt `json:\"deleted_at\" gorm:\"column:deleted_at;type:datetime;comment:删除时间\"` // 删除时间\n"
    ));
    assert!(model.ends_with("func (u *User) TableName() string {\n\treturn \"t_user\"\n}"));
}

#[test]
fn test_gists_join_tables() {
    let dir = tempfile::tempdir().unwrap();
    generate_project(&mut catalog(), &project(dir.path()), &Verbatim, &DelimiterValidator).unwrap();

    let convert = read(dir.path(), "convert-api.txt");
    let user = convert.find("func ConvertUserToAPI(src *model.User) *types.User {").unwrap();
    let role = convert.find("func ConvertRoleToAPI(src *model.Role) *types.Role {").unwrap();
    assert!(user < role);
    assert!(convert.contains("\n}\n\n// ConvertRoleToAPI"));

    let rpc = read(dir.path(), "convert-rpc.txt");
    assert!(rpc.contains("\tif src.CreatedAt != nil {\n\t\tdst.CreatedAt = src.CreatedAt.UnixMilli()\n\t}\n"));
    assert!(rpc.contains("\tif src.Status != nil {\n\t\tdst.Status = *src.Status\n\t}\n"));

    let update_map = read(dir.path(), "update-map.txt");
    assert!(update_map.starts_with("// ---------------------- User 用户 ---------------------- //\n"));
    assert!(update_map.contains("\n\n// ---------------------- Role 角色 ---------------------- //\n"));
    assert!(update_map.contains("if req.Status != nil {\n\tupdateMap[\"status\"] = *req.Status\n}"));

    let filter = read(dir.path(), "filter.txt");
    assert!(filter.contains("func FilterUser(db *gorm.DB, req *types.FilterUserReq) *gorm.DB {"));
    assert!(filter.contains("func FilterRole(db *gorm.DB, req *types.FilterRoleReq) *gorm.DB {"));
}

#[test]
fn test_route_rejection_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let reject = |_: &str| -> Result<(), ApiFormatError> {
        Err(ApiFormatError::Validation {
            line: 3,
            column: 7,
            message: "unexpected token".to_string(),
        })
    };
    let err = generate_project(&mut catalog(), &project(dir.path()), &Verbatim, &reject).unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("t_user"), "{message}");
    assert!(message.contains("3:7: unexpected token"), "{message}");
    assert!(!dir.path().join("t.api").exists());
    assert!(!dir.path().join("convert-api.txt").exists());
}

#[test]
fn test_project_formatted_with_gofmt() {
    let gofmt = Gofmt::from_env();
    if !gofmt.is_available() {
        println!("Skipping test: gofmt not available");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    generate_project(&mut catalog(), &project(dir.path()), &gofmt, &DelimiterValidator).unwrap();

    let api = read(dir.path(), "user.api");
    assert!(api.contains("type User {\n\tID "));
    assert!(!api.contains(" struct "));
    let model = read(dir.path(), "model/t_user.go");
    assert!(model.contains("\tDeletedAt gorm.DeletedAt "));
}
