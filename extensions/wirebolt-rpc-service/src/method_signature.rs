use wirebolt::rpc::is_param_type_assignable;
use xxhash_rust::xxh3::Xxh3;

/// Hashes a method name and its parameter-type list into a stable id.
///
/// Used as the method-cache key, so a repeated call resolves without any
/// string comparison against the registered signatures.
pub fn method_signature_id<S: AsRef<str>>(method_name: &str, parameter_types: &[S]) -> u64 {
    let mut hasher = Xxh3::new();
    hasher.update(method_name.as_bytes());
    hasher.update(b"(");
    for (index, param_type) in parameter_types.iter().enumerate() {
        if index > 0 {
            hasher.update(b",");
        }
        hasher.update(param_type.as_ref().as_bytes());
    }
    hasher.update(b")");
    hasher.digest()
}

/// A method name plus its declared parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RpcMethodSignature {
    id: u64,
    method_name: String,
    parameter_types: Vec<String>,
}

impl RpcMethodSignature {
    pub fn new(method_name: impl Into<String>, parameter_types: Vec<String>) -> Self {
        let method_name = method_name.into();
        Self {
            id: method_signature_id(&method_name, &parameter_types),
            method_name,
            parameter_types,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    pub fn matches_exactly(&self, method_name: &str, supplied: &[String]) -> bool {
        self.method_name == method_name && self.parameter_types == supplied
    }

    /// Whether values described by `supplied` can be passed to this method.
    pub fn accepts(&self, method_name: &str, supplied: &[String]) -> bool {
        self.method_name == method_name
            && self.parameter_types.len() == supplied.len()
            && self
                .parameter_types
                .iter()
                .zip(supplied)
                .all(|(declared, supplied)| is_param_type_assignable(declared, supplied))
    }
}

impl std::fmt::Display for RpcMethodSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.method_name, self.parameter_types.join(", "))
    }
}
