//! Well-known TypeIDs and annotation names.

pub const CONTEXT_TYPE_ID: &str = "context:Context";
pub const ERROR_TYPE_ID: &str = "error";
pub const IO_READER_TYPE_ID: &str = "io:Reader";
pub const IO_READ_CLOSER_TYPE_ID: &str = "io:ReadCloser";
pub const UNSAFE_POINTER_TYPE_ID: &str = "unsafe:Pointer";
pub const EMPTY_INTERFACE_TYPE_ID: &str = "interface{}";

/// Infix carried by IDs the parser assigns to inline interface literals
/// (`<pkg>:interface:anonymous<n>`).
pub const ANONYMOUS_INTERFACE_MARK: &str = ":interface:anonymous";

/// Contract annotation enabling the HTTP server transport.
pub const ANNOTATION_HTTP_SERVER: &str = "http-server";

/// Generic instantiations are rendered with their type arguments, e.g.
/// `pkg:List[int]`.
#[must_use]
pub fn is_generic_instance(type_id: &str) -> bool {
    type_id.contains('[') && type_id.contains(']')
}

/// `interface{}` or an ID shaped like `*:interface:anonymous*`.
#[must_use]
pub fn is_anonymous_interface(type_id: &str) -> bool {
    type_id == EMPTY_INTERFACE_TYPE_ID || type_id.contains(ANONYMOUS_INTERFACE_MARK)
}
