use serde::ser::{Serialize, Serializer};

/// Module path of the validator packages referenced by generated snippets.
pub const VALIDATORS_MODULE: &str = "github.com/hashicorp/terraform-plugin-framework-validators";

/// The value family a validator applies to; selects the validator package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorTarget {
    String,
    Int64,
    Float64,
    List,
    Set,
    Map,
}

impl ValidatorTarget {
    pub fn package(&self) -> &'static str {
        match self {
            ValidatorTarget::String => "stringvalidator",
            ValidatorTarget::Int64 => "int64validator",
            ValidatorTarget::Float64 => "float64validator",
            ValidatorTarget::List => "listvalidator",
            ValidatorTarget::Set => "setvalidator",
            ValidatorTarget::Map => "mapvalidator",
        }
    }
}

/// Which check a validator performs, with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorRule {
    OneOf(Vec<serde_json::Value>),
    AtLeast(f64),
    AtMost(f64),
    Between(f64, f64),
    LengthAtLeast(u64),
    LengthAtMost(u64),
    LengthBetween(u64, u64),
    SizeAtLeast(u64),
    SizeAtMost(u64),
    SizeBetween(u64, u64),
    UniqueValues,
}

/// A validator derived from a schema constraint keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    pub target: ValidatorTarget,
    pub rule: ValidatorRule,
}

impl Validator {
    pub fn new(target: ValidatorTarget, rule: ValidatorRule) -> Self {
        Self { target, rule }
    }

    pub fn import_path(&self) -> String {
        format!("{}/{}", VALIDATORS_MODULE, self.target.package())
    }

    /// The call expression that constructs this validator.
    pub fn schema_definition(&self) -> String {
        let pkg = self.target.package();
        match &self.rule {
            ValidatorRule::OneOf(values) => {
                let literals: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                format!("{pkg}.OneOf({})", literals.join(", "))
            }
            ValidatorRule::AtLeast(min) => format!("{pkg}.AtLeast({})", self.lower(*min)),
            ValidatorRule::AtMost(max) => format!("{pkg}.AtMost({})", self.upper(*max)),
            ValidatorRule::Between(min, max) => {
                format!("{pkg}.Between({}, {})", self.lower(*min), self.upper(*max))
            }
            ValidatorRule::LengthAtLeast(min) => format!("{pkg}.LengthAtLeast({min})"),
            ValidatorRule::LengthAtMost(max) => format!("{pkg}.LengthAtMost({max})"),
            ValidatorRule::LengthBetween(min, max) => {
                format!("{pkg}.LengthBetween({min}, {max})")
            }
            ValidatorRule::SizeAtLeast(min) => format!("{pkg}.SizeAtLeast({min})"),
            ValidatorRule::SizeAtMost(max) => format!("{pkg}.SizeAtMost({max})"),
            ValidatorRule::SizeBetween(min, max) => format!("{pkg}.SizeBetween({min}, {max})"),
            ValidatorRule::UniqueValues => format!("{pkg}.UniqueValues()"),
        }
    }

    /// Integer targets round inward so a fractional bound admits the same
    /// integers.
    fn lower(&self, value: f64) -> String {
        self.bound(value, f64::ceil)
    }

    fn upper(&self, value: f64) -> String {
        self.bound(value, f64::floor)
    }

    fn bound(&self, value: f64, round: fn(f64) -> f64) -> String {
        match self.target {
            ValidatorTarget::Int64 => format!("{}", round(value) as i64),
            _ => format!("{value:?}"),
        }
    }
}

#[derive(serde::Serialize)]
struct CustomValidator {
    custom: CustomDefinition,
}

#[derive(serde::Serialize)]
struct CustomDefinition {
    imports: Vec<Import>,
    schema_definition: String,
}

#[derive(serde::Serialize)]
struct Import {
    path: String,
}

/// Serializes as a `custom` validator entry carrying its import and snippet.
impl Serialize for Validator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CustomValidator {
            custom: CustomDefinition {
                imports: vec![Import {
                    path: self.import_path(),
                }],
                schema_definition: self.schema_definition(),
            },
        }
        .serialize(serializer)
    }
}
