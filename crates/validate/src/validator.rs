use crate::error::{Rejection, Result, ValidationError, VarRole};
use std::collections::HashSet;
use tg_model::{
    is_anonymous_interface, is_generic_instance, Contract, Method, Project, TypeKind, TypeRef,
    Variable, CONTEXT_TYPE_ID, IO_READER_TYPE_ID, IO_READ_CLOSER_TYPE_ID, UNSAFE_POINTER_TYPE_ID,
};

/// Check project-level rules, then every contract.
pub fn validate_project(project: &Project) -> Result<()> {
    if project.module_path.trim().is_empty() {
        return Err(ValidationError::EmptyModulePath);
    }

    let mut seen = HashSet::new();
    for contract in &project.contracts {
        if !seen.insert(contract.id.as_str()) {
            return Err(ValidationError::DuplicateContract(contract.id.clone()));
        }
    }

    for contract in &project.contracts {
        validate_contract(contract, project)?;
    }
    log::debug!(
        "Validated {} contracts of {}",
        project.contracts.len(),
        project.module_path
    );
    Ok(())
}

/// Check naming and type admissibility of every method in `contract`.
///
/// Type IDs are resolved through `project.types`; IDs with no entry there
/// (builtins, external packages) are leaves.
pub fn validate_contract(contract: &Contract, project: &Project) -> Result<()> {
    for method in &contract.methods {
        check_names(contract, method)?;
        check_stream_types(contract, method)?;

        for (role, position, var) in numbered(method) {
            let mut walker = TypeWalker::new(project);
            if let Err((type_id, reason)) = walker.check_ref(&var.type_ref) {
                return Err(ValidationError::UnsupportedType {
                    contract: contract.name.clone(),
                    method: method.name.clone(),
                    role,
                    name: display_name(var, position),
                    type_id,
                    reason,
                });
            }
        }
    }
    Ok(())
}

/// Arguments then results, each numbered from 1 within its role.
fn numbered(method: &Method) -> impl Iterator<Item = (VarRole, usize, &Variable)> {
    let args = method
        .args
        .iter()
        .enumerate()
        .map(|(index, var)| (VarRole::Argument, index + 1, var));
    let results = method
        .results
        .iter()
        .enumerate()
        .map(|(index, var)| (VarRole::Result, index + 1, var));
    args.chain(results)
}

fn check_names(contract: &Contract, method: &Method) -> Result<()> {
    let unnamed = |role, position| ValidationError::UnnamedVariable {
        contract: contract.name.clone(),
        method: method.name.clone(),
        role,
        position,
    };
    if let Some(position) = method
        .args
        .iter()
        .position(|arg| !arg.is_context() && arg.name.is_empty())
    {
        return Err(unnamed(VarRole::Argument, position + 1));
    }
    if let Some(position) = method
        .results
        .iter()
        .position(|res| !res.is_error() && res.name.is_empty())
    {
        return Err(unnamed(VarRole::Result, position + 1));
    }
    Ok(())
}

/// Streaming arguments and results only make sense behind an HTTP server.
fn check_stream_types(contract: &Contract, method: &Method) -> Result<()> {
    if contract.is_http_server() {
        return Ok(());
    }
    let streamed = method
        .args
        .iter()
        .find(|arg| arg.type_id() == IO_READER_TYPE_ID)
        .or_else(|| {
            method
                .results
                .iter()
                .find(|res| res.type_id() == IO_READ_CLOSER_TYPE_ID)
        });
    match streamed {
        Some(var) => Err(ValidationError::StreamRequiresHttpServer {
            contract: contract.name.clone(),
            method: method.name.clone(),
            type_id: var.type_id().to_string(),
        }),
        None => Ok(()),
    }
}

fn display_name(var: &Variable, position: usize) -> String {
    if var.name.is_empty() {
        format!("#{position}")
    } else {
        var.name.clone()
    }
}

/// Depth-first walk over the type graph reachable from one variable.
struct TypeWalker<'p> {
    project: &'p Project,
    visited: HashSet<&'p str>,
}

type Verdict = std::result::Result<(), (String, Rejection)>;

impl<'p> TypeWalker<'p> {
    fn new(project: &'p Project) -> Self {
        Self {
            project,
            visited: HashSet::new(),
        }
    }

    fn check_ref(&mut self, type_ref: &'p TypeRef) -> Verdict {
        if !type_ref.type_id.is_empty() {
            self.check_id(&type_ref.type_id)?;
        }
        if let Some(key) = &type_ref.map_key {
            self.check_ref(key)?;
        }
        if let Some(value) = &type_ref.map_value {
            self.check_ref(value)?;
        }
        Ok(())
    }

    fn check_id(&mut self, type_id: &'p str) -> Verdict {
        if !self.visited.insert(type_id) {
            return Ok(());
        }
        let reject = |reason| Err((type_id.to_string(), reason));

        if is_generic_instance(type_id) {
            return reject(Rejection::GenericInstance);
        }
        if type_id == UNSAFE_POINTER_TYPE_ID {
            return reject(Rejection::UnsafePointer);
        }

        let project = self.project;
        let Some(ty) = project.type_of(type_id) else {
            return match inline_kind(type_id) {
                Some(TypeKind::Chan) => reject(Rejection::Channel),
                Some(TypeKind::Function) => reject(Rejection::Function),
                _ => Ok(()),
            };
        };

        match ty.kind {
            TypeKind::Chan => reject(Rejection::Channel),
            TypeKind::Function => reject(Rejection::Function),
            TypeKind::Any | TypeKind::Basic => Ok(()),
            TypeKind::Interface => {
                if is_allowed_interface(type_id) {
                    Ok(())
                } else {
                    reject(Rejection::Interface)
                }
            }
            TypeKind::Struct => {
                for field in &ty.struct_fields {
                    self.check_ref(&field.type_ref)?;
                }
                Ok(())
            }
            TypeKind::Alias => match &ty.alias_of {
                Some(target) => self.check_id(target),
                None => Ok(()),
            },
        }
    }
}

fn is_allowed_interface(type_id: &str) -> bool {
    type_id == CONTEXT_TYPE_ID
        || type_id == IO_READER_TYPE_ID
        || type_id == IO_READ_CLOSER_TYPE_ID
        || is_anonymous_interface(type_id)
}

/// Kind of an unregistered literal type expression such as `chan int`.
fn inline_kind(type_id: &str) -> Option<TypeKind> {
    let trimmed = type_id.trim_start();
    if trimmed.starts_with("chan ") || trimmed.starts_with("chan<-") || trimmed.starts_with("<-chan") {
        Some(TypeKind::Chan)
    } else if trimmed.starts_with("func(") {
        Some(TypeKind::Function)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tg_model::{StructField, Type, ANNOTATION_HTTP_SERVER, ERROR_TYPE_ID};

    fn method(name: &str, args: Vec<Variable>, results: Vec<Variable>) -> Method {
        Method {
            name: name.to_string(),
            args,
            results,
            ..Method::default()
        }
    }

    fn project_with(methods: Vec<Method>) -> Project {
        let mut project = Project::new("github.com/acme/x");
        project.contracts.push(Contract {
            id: "github.com/acme/x/svc:Users".to_string(),
            name: "Users".to_string(),
            pkg_path: "github.com/acme/x/svc".to_string(),
            methods,
            ..Contract::default()
        });
        project
    }

    fn ctx() -> Variable {
        Variable::new("ctx", TypeRef::named(CONTEXT_TYPE_ID))
    }

    fn err() -> Variable {
        Variable::new("", TypeRef::named(ERROR_TYPE_ID))
    }

    #[test]
    fn plain_signature_is_accepted() {
        let project = project_with(vec![method(
            "Get",
            vec![ctx(), Variable::new("id", TypeRef::named("int"))],
            vec![Variable::new("name", TypeRef::named("string")), err()],
        )]);
        validate_project(&project).unwrap();
    }

    #[test]
    fn empty_module_path_is_rejected() {
        let project = Project::new("  ");
        assert_eq!(
            validate_project(&project).unwrap_err(),
            ValidationError::EmptyModulePath
        );
    }

    #[test]
    fn duplicate_contract_ids_are_rejected() {
        let mut project = project_with(Vec::new());
        let copy = project.contracts[0].clone();
        project.contracts.push(copy);
        assert!(matches!(
            validate_project(&project),
            Err(ValidationError::DuplicateContract(id)) if id == "github.com/acme/x/svc:Users"
        ));
    }

    #[test]
    fn unnamed_context_and_error_are_allowed() {
        let project = project_with(vec![method(
            "Ping",
            vec![Variable::new("", TypeRef::named(CONTEXT_TYPE_ID))],
            vec![err()],
        )]);
        validate_project(&project).unwrap();
    }

    #[test]
    fn unnamed_argument_is_rejected() {
        let project = project_with(vec![method(
            "Get",
            vec![ctx(), Variable::new("", TypeRef::named("int"))],
            vec![err()],
        )]);
        let error = validate_project(&project).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Contract Users: method Get: argument #2 must be named"
        );
    }

    #[test]
    fn unnamed_result_is_rejected() {
        let project = project_with(vec![method(
            "Get",
            vec![ctx()],
            vec![Variable::new("", TypeRef::named("string")), err()],
        )]);
        assert!(matches!(
            validate_project(&project),
            Err(ValidationError::UnnamedVariable { role: VarRole::Result, position: 1, .. })
        ));
    }

    #[test]
    fn positions_restart_for_results() {
        let get = method(
            "Get",
            vec![ctx(), Variable::new("id", TypeRef::named("int"))],
            vec![err()],
        );
        let positions: Vec<_> = numbered(&get)
            .map(|(role, position, _)| (role, position))
            .collect();
        assert_eq!(
            positions,
            vec![
                (VarRole::Argument, 1),
                (VarRole::Argument, 2),
                (VarRole::Result, 1),
            ]
        );
        assert_eq!(display_name(&err(), 1), "#1");
    }

    #[test]
    fn channel_argument_names_contract_method_and_role() {
        let project = project_with(vec![method(
            "Watch",
            vec![ctx(), Variable::new("events", TypeRef::named("chan int"))],
            vec![err()],
        )]);
        let error = validate_contract(&project.contracts[0], &project).unwrap_err();
        let text = error.to_string();
        assert!(text.contains("Contract Users"), "{text}");
        assert!(text.contains("method Watch"), "{text}");
        assert!(text.contains("argument events"), "{text}");
        assert!(matches!(
            error,
            ValidationError::UnsupportedType { reason: Rejection::Channel, .. }
        ));
    }

    #[test]
    fn rejection_table() {
        let cases = [
            ("svc:Page[int]", Type::structure(Vec::new()), Some(Rejection::GenericInstance)),
            ("svc:Events", Type::new(TypeKind::Chan), Some(Rejection::Channel)),
            ("svc:Callback", Type::new(TypeKind::Function), Some(Rejection::Function)),
            (UNSAFE_POINTER_TYPE_ID, Type::new(TypeKind::Basic), Some(Rejection::UnsafePointer)),
            ("svc:Anything", Type::new(TypeKind::Any), None),
            (CONTEXT_TYPE_ID, Type::new(TypeKind::Interface), None),
            ("interface{}", Type::new(TypeKind::Interface), None),
            ("svc:Req:interface:anonymous", Type::new(TypeKind::Interface), None),
            ("svc:Store", Type::new(TypeKind::Interface), Some(Rejection::Interface)),
            ("svc:Name", Type::new(TypeKind::Basic), None),
        ];
        for (type_id, ty, expected) in cases {
            let mut project = project_with(vec![method(
                "Do",
                vec![ctx(), Variable::new("v", TypeRef::named(type_id))],
                vec![err()],
            )]);
            project.types.insert(type_id.to_string(), ty);
            let actual = match validate_project(&project) {
                Ok(()) => None,
                Err(ValidationError::UnsupportedType { reason, .. }) => Some(reason),
                Err(other) => panic!("{type_id}: unexpected {other}"),
            };
            assert_eq!(actual, expected, "{type_id}");
        }
    }

    #[test]
    fn nested_field_rejection_reports_inner_type() {
        let mut project = project_with(vec![method(
            "Create",
            vec![ctx(), Variable::new("req", TypeRef::named("svc:Request"))],
            vec![err()],
        )]);
        project.types.insert(
            "svc:Request".to_string(),
            Type::structure(vec![
                StructField::new("id", TypeRef::named("int")),
                StructField::new(
                    "hooks",
                    TypeRef::map_of(TypeRef::named("string"), TypeRef::named("svc:Hook")),
                ),
            ]),
        );
        project
            .types
            .insert("svc:Hook".to_string(), Type::new(TypeKind::Function));

        match validate_project(&project).unwrap_err() {
            ValidationError::UnsupportedType {
                name,
                type_id,
                reason,
                ..
            } => {
                assert_eq!(name, "req");
                assert_eq!(type_id, "svc:Hook");
                assert_eq!(reason, Rejection::Function);
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn slice_and_map_key_are_checked() {
        let mut project = project_with(vec![method(
            "List",
            vec![ctx()],
            vec![Variable::new("items", TypeRef::slice_of("svc:Events")), err()],
        )]);
        project
            .types
            .insert("svc:Events".to_string(), Type::new(TypeKind::Chan));
        assert!(validate_project(&project).is_err());

        let mut project = project_with(vec![method(
            "Index",
            vec![ctx()],
            vec![
                Variable::new(
                    "byKey",
                    TypeRef::map_of(TypeRef::named("svc:Key[string]"), TypeRef::named("int")),
                ),
                err(),
            ],
        )]);
        project
            .types
            .insert("svc:Key[string]".to_string(), Type::new(TypeKind::Basic));
        assert!(matches!(
            validate_project(&project),
            Err(ValidationError::UnsupportedType { reason: Rejection::GenericInstance, .. })
        ));
    }

    #[test]
    fn cyclic_struct_through_alias_terminates() {
        let mut project = project_with(vec![method(
            "Tree",
            vec![ctx(), Variable::new("root", TypeRef::named("svc:Node"))],
            vec![err()],
        )]);
        project.types.insert(
            "svc:Node".to_string(),
            Type::structure(vec![
                StructField::new("children", TypeRef::slice_of("svc:Nodes")),
                StructField::new("parent", TypeRef::named("svc:Node")),
            ]),
        );
        project
            .types
            .insert("svc:Nodes".to_string(), Type::alias("svc:Node"));
        validate_project(&project).unwrap();
    }

    #[test]
    fn streams_require_http_server_annotation() {
        let upload = method(
            "Upload",
            vec![ctx(), Variable::new("body", TypeRef::named(IO_READER_TYPE_ID))],
            vec![err()],
        );
        let mut project = project_with(vec![upload]);
        project
            .types
            .insert(IO_READER_TYPE_ID.to_string(), Type::new(TypeKind::Interface));
        assert!(matches!(
            validate_project(&project),
            Err(ValidationError::StreamRequiresHttpServer { type_id, .. }) if type_id == IO_READER_TYPE_ID
        ));

        project.contracts[0]
            .annotations
            .insert(ANNOTATION_HTTP_SERVER.to_string(), String::new());
        validate_project(&project).unwrap();
    }

    #[test]
    fn read_closer_result_requires_http_server_annotation() {
        let project = project_with(vec![method(
            "Download",
            vec![ctx(), Variable::new("id", TypeRef::named("string"))],
            vec![Variable::new("body", TypeRef::named(IO_READ_CLOSER_TYPE_ID)), err()],
        )]);
        assert!(matches!(
            validate_project(&project),
            Err(ValidationError::StreamRequiresHttpServer { .. })
        ));
    }
}
