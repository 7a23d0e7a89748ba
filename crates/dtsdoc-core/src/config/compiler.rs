//! TypeScript compiler option validation.
//!
//! The generator hands these options to the TypeScript compiler, so they are
//! checked up front against the option table below. Every problem is
//! collected, not just the first. Options missing from the table are passed
//! through with a warning; only a wrong value fails validation.

use crate::diagnostics::DiagnosticSink;
use crate::error::codes;
use serde_json::{Map, Value};

/// Validates a `compilerOptions` object.
pub trait CompilerOptionsValidator {
    /// Returns the normalized options, or every diagnostic message.
    ///
    /// `null` values unset an inherited option and are left out of the result.
    fn validate(
        &self,
        options: &Map<String, Value>,
        sink: &dyn DiagnosticSink,
    ) -> Result<Map<String, Value>, Vec<String>>;
}

#[derive(Debug, Clone, Copy)]
enum OptionKind {
    Bool,
    String,
    Number,
    StringList,
    /// String list whose values are matched case-insensitively (`lib`).
    LowercaseList,
    Object,
    /// List of objects (`plugins`).
    ObjectList,
    Enum(&'static [&'static str]),
}

impl OptionKind {
    fn type_name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::String | Self::Enum(_) => "string",
            Self::Number => "number",
            Self::StringList | Self::LowercaseList => "list",
            Self::Object => "object",
            Self::ObjectList => "list of objects",
        }
    }
}

const TARGETS: &[&str] = &[
    "es3", "es5", "es6", "es2015", "es2016", "es2017", "es2018", "es2019", "es2020", "es2021",
    "es2022", "es2023", "es2024", "es2025", "esnext",
];
const MODULES: &[&str] = &[
    "none", "commonjs", "amd", "umd", "system", "es6", "es2015", "es2020", "es2022", "esnext",
    "node16", "node18", "node20", "nodenext", "preserve",
];
const MODULE_RESOLUTIONS: &[&str] =
    &["classic", "node", "node10", "node16", "nodenext", "bundler"];
const JSX: &[&str] = &["preserve", "react", "react-native", "react-jsx", "react-jsxdev"];
const NEW_LINES: &[&str] = &["crlf", "lf"];
const MODULE_DETECTION: &[&str] = &["auto", "legacy", "force"];
const IMPORTS_NOT_USED: &[&str] = &["remove", "preserve", "error"];

const KNOWN_OPTIONS: &[(&str, OptionKind)] = &[
    ("allowArbitraryExtensions", OptionKind::Bool),
    ("allowImportingTsExtensions", OptionKind::Bool),
    ("allowJs", OptionKind::Bool),
    ("allowSyntheticDefaultImports", OptionKind::Bool),
    ("allowUmdGlobalAccess", OptionKind::Bool),
    ("allowUnreachableCode", OptionKind::Bool),
    ("allowUnusedLabels", OptionKind::Bool),
    ("alwaysStrict", OptionKind::Bool),
    ("assumeChangesOnlyAffectDirectDependencies", OptionKind::Bool),
    ("baseUrl", OptionKind::String),
    ("charset", OptionKind::String),
    ("checkJs", OptionKind::Bool),
    ("composite", OptionKind::Bool),
    ("customConditions", OptionKind::StringList),
    ("declaration", OptionKind::Bool),
    ("declarationDir", OptionKind::String),
    ("declarationMap", OptionKind::Bool),
    ("disableReferencedProjectLoad", OptionKind::Bool),
    ("disableSizeLimit", OptionKind::Bool),
    ("disableSolutionSearching", OptionKind::Bool),
    ("disableSourceOfProjectReferenceRedirect", OptionKind::Bool),
    ("downlevelIteration", OptionKind::Bool),
    ("emitBOM", OptionKind::Bool),
    ("emitDeclarationOnly", OptionKind::Bool),
    ("emitDecoratorMetadata", OptionKind::Bool),
    ("erasableSyntaxOnly", OptionKind::Bool),
    ("esModuleInterop", OptionKind::Bool),
    ("exactOptionalPropertyTypes", OptionKind::Bool),
    ("experimentalDecorators", OptionKind::Bool),
    ("explainFiles", OptionKind::Bool),
    ("extendedDiagnostics", OptionKind::Bool),
    ("forceConsistentCasingInFileNames", OptionKind::Bool),
    ("generateCpuProfile", OptionKind::String),
    ("generateTrace", OptionKind::String),
    ("importHelpers", OptionKind::Bool),
    ("importsNotUsedAsValues", OptionKind::Enum(IMPORTS_NOT_USED)),
    ("incremental", OptionKind::Bool),
    ("inlineSourceMap", OptionKind::Bool),
    ("inlineSources", OptionKind::Bool),
    ("isolatedDeclarations", OptionKind::Bool),
    ("isolatedModules", OptionKind::Bool),
    ("jsx", OptionKind::Enum(JSX)),
    ("jsxFactory", OptionKind::String),
    ("jsxFragmentFactory", OptionKind::String),
    ("jsxImportSource", OptionKind::String),
    ("keyofStringsOnly", OptionKind::Bool),
    ("lib", OptionKind::LowercaseList),
    ("libReplacement", OptionKind::Bool),
    ("listEmittedFiles", OptionKind::Bool),
    ("listFiles", OptionKind::Bool),
    ("locale", OptionKind::String),
    ("mapRoot", OptionKind::String),
    ("maxNodeModuleJsDepth", OptionKind::Number),
    ("module", OptionKind::Enum(MODULES)),
    ("moduleDetection", OptionKind::Enum(MODULE_DETECTION)),
    ("moduleResolution", OptionKind::Enum(MODULE_RESOLUTIONS)),
    ("moduleSuffixes", OptionKind::StringList),
    ("newLine", OptionKind::Enum(NEW_LINES)),
    ("noCheck", OptionKind::Bool),
    ("noEmit", OptionKind::Bool),
    ("noEmitHelpers", OptionKind::Bool),
    ("noEmitOnError", OptionKind::Bool),
    ("noErrorTruncation", OptionKind::Bool),
    ("noFallthroughCasesInSwitch", OptionKind::Bool),
    ("noImplicitAny", OptionKind::Bool),
    ("noImplicitOverride", OptionKind::Bool),
    ("noImplicitReturns", OptionKind::Bool),
    ("noImplicitThis", OptionKind::Bool),
    ("noImplicitUseStrict", OptionKind::Bool),
    ("noLib", OptionKind::Bool),
    ("noPropertyAccessFromIndexSignature", OptionKind::Bool),
    ("noResolve", OptionKind::Bool),
    ("noStrictGenericChecks", OptionKind::Bool),
    ("noUncheckedIndexedAccess", OptionKind::Bool),
    ("noUncheckedSideEffectImports", OptionKind::Bool),
    ("noUnusedLocals", OptionKind::Bool),
    ("noUnusedParameters", OptionKind::Bool),
    ("out", OptionKind::String),
    ("outDir", OptionKind::String),
    ("outFile", OptionKind::String),
    ("paths", OptionKind::Object),
    ("plugins", OptionKind::ObjectList),
    ("preserveConstEnums", OptionKind::Bool),
    ("preserveSymlinks", OptionKind::Bool),
    ("preserveValueImports", OptionKind::Bool),
    ("preserveWatchOutput", OptionKind::Bool),
    ("pretty", OptionKind::Bool),
    ("reactNamespace", OptionKind::String),
    ("removeComments", OptionKind::Bool),
    ("resolveJsonModule", OptionKind::Bool),
    ("resolvePackageJsonExports", OptionKind::Bool),
    ("resolvePackageJsonImports", OptionKind::Bool),
    ("rewriteRelativeImportExtensions", OptionKind::Bool),
    ("rootDir", OptionKind::String),
    ("rootDirs", OptionKind::StringList),
    ("skipDefaultLibCheck", OptionKind::Bool),
    ("skipLibCheck", OptionKind::Bool),
    ("sourceMap", OptionKind::Bool),
    ("sourceRoot", OptionKind::String),
    ("strict", OptionKind::Bool),
    ("strictBindCallApply", OptionKind::Bool),
    ("strictBuiltinIteratorReturn", OptionKind::Bool),
    ("strictFunctionTypes", OptionKind::Bool),
    ("strictNullChecks", OptionKind::Bool),
    ("strictPropertyInitialization", OptionKind::Bool),
    ("stripInternal", OptionKind::Bool),
    ("suppressExcessPropertyErrors", OptionKind::Bool),
    ("suppressImplicitAnyIndexErrors", OptionKind::Bool),
    ("target", OptionKind::Enum(TARGETS)),
    ("traceResolution", OptionKind::Bool),
    ("tsBuildInfoFile", OptionKind::String),
    ("typeRoots", OptionKind::StringList),
    ("types", OptionKind::StringList),
    ("useDefineForClassFields", OptionKind::Bool),
    ("useUnknownInCatchVariables", OptionKind::Bool),
    ("verbatimModuleSyntax", OptionKind::Bool),
];

/// Table-driven validator covering the TypeScript 5 option set.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCompilerOptions;

impl CompilerOptionsValidator for BuiltinCompilerOptions {
    fn validate(
        &self,
        options: &Map<String, Value>,
        sink: &dyn DiagnosticSink,
    ) -> Result<Map<String, Value>, Vec<String>> {
        let mut normalized = Map::new();
        let mut errors = Vec::new();

        for (name, value) in options {
            // null unsets an inherited option
            if value.is_null() {
                continue;
            }
            let Some(kind) = lookup(name) else {
                sink.warn(
                    codes::UNKNOWN_COMPILER_OPTION,
                    format!("Unknown compiler option '{name}'; passing it through."),
                );
                normalized.insert(name.clone(), value.clone());
                continue;
            };
            match check(name, kind, value) {
                Ok(v) => {
                    normalized.insert(name.clone(), v);
                }
                Err(msg) => errors.push(msg),
            }
        }

        if errors.is_empty() {
            Ok(normalized)
        } else {
            Err(errors)
        }
    }
}

fn lookup(name: &str) -> Option<OptionKind> {
    KNOWN_OPTIONS
        .binary_search_by(|(known, _)| known.cmp(&name))
        .ok()
        .map(|i| KNOWN_OPTIONS[i].1)
}

fn check(name: &str, kind: OptionKind, value: &Value) -> Result<Value, String> {
    let wrong_type = || {
        format!(
            "Compiler option '{name}' requires a value of type {}.",
            kind.type_name()
        )
    };

    match kind {
        OptionKind::Bool if value.is_boolean() => Ok(value.clone()),
        OptionKind::String if value.is_string() => Ok(value.clone()),
        OptionKind::Number if value.is_number() => Ok(value.clone()),
        OptionKind::Object if value.is_object() => Ok(value.clone()),
        OptionKind::ObjectList
            if value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_object)) =>
        {
            Ok(value.clone())
        }
        OptionKind::StringList | OptionKind::LowercaseList => {
            let items = value.as_array().ok_or_else(wrong_type)?;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let s = item.as_str().ok_or_else(|| {
                    format!("Compiler option '{name}' requires a list of strings.")
                })?;
                out.push(Value::String(if matches!(kind, OptionKind::LowercaseList) {
                    s.to_ascii_lowercase()
                } else {
                    s.to_string()
                }));
            }
            Ok(Value::Array(out))
        }
        OptionKind::Enum(allowed) => {
            let s = value.as_str().ok_or_else(wrong_type)?;
            let lower = s.to_ascii_lowercase();
            if allowed.contains(&lower.as_str()) {
                Ok(Value::String(lower))
            } else {
                let choices: Vec<String> = allowed.iter().map(|a| format!("'{a}'")).collect();
                Err(format!(
                    "Argument for '--{name}' option must be: {}.",
                    choices.join(", ")
                ))
            }
        }
        _ => Err(wrong_type()),
    }
}
