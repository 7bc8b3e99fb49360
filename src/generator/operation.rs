use super::{parse_type, Generator};
use crate::document::{
    rewrite_path, set_operation_by_method, Header, HttpMethod, MediaType, Operation, Parameter,
    ParameterLocation, RequestBody, Response, JSON_MEDIA_TYPE,
};
use crate::error::{GeneratorError, Result};
use crate::schema::{Schema, SchemaOrRef};
use crate::tags::{extract_annotations, field_name_from_tag, param_location};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Operation-level metadata passed to [`Generator::add_operation`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationInfo {
    /// Operation id, unique across the document
    pub id: String,
    pub summary: String,
    pub description: String,
    pub deprecated: bool,
    /// Status code of the success response
    pub status_code: u16,
    pub status_description: String,
    /// Additional responses, such as errors
    pub responses: Vec<OperationResponse>,
    /// Headers of the success response
    pub headers: Vec<ResponseHeader>,
}

impl Default for OperationInfo {
    fn default() -> Self {
        Self {
            id: String::new(),
            summary: String::new(),
            description: String::new(),
            deprecated: false,
            status_code: 200,
            status_description: String::new(),
            responses: Vec::new(),
            headers: Vec::new(),
        }
    }
}

/// An additional response of an operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationResponse {
    pub code: String,
    pub description: String,
    /// Type expression of the response body; `None` means no body
    pub model: Option<String>,
}

/// A header sent with the success response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseHeader {
    pub name: String,
    pub description: String,
    /// Type expression of the header value; `None` means a plain string
    pub model: Option<String>,
}

impl Generator {
    /// Adds an operation to the document.
    ///
    /// `input` is the struct whose fields become parameters and request body, `output`
    /// the body of the success response; both are type expressions such as
    /// `handlers::CreateUser`. The path is rewritten from `/users/:id` to `/users/{id}`.
    ///
    /// Schema problems are recorded in [`errors`](Generator::errors) and do not fail the
    /// call. On failure nothing is committed: paths, tags, ids and schemas are left as
    /// they were.
    ///
    /// # Errors
    ///
    /// Fails on an unknown method, an input type that is not a struct, an empty or
    /// already used id, conflicting parameter locations, or an invalid or duplicate
    /// status code.
    pub fn add_operation(
        &mut self,
        path: &str,
        method: &str,
        tag: &str,
        input: Option<&str>,
        output: Option<&str>,
        info: &OperationInfo,
    ) -> Result<()> {
        let method: HttpMethod = method.parse()?;
        let input = input.map(parse_type).transpose()?;
        let output = output.map(parse_type).transpose()?;

        if let Some(input) = &input {
            self.struct_def(input)?;
        }
        if info.id.is_empty() {
            return Err(GeneratorError::EmptyOperationId);
        }
        if self.operation_ids.contains(&info.id) {
            return Err(GeneratorError::DuplicateOperationId(info.id.clone()));
        }

        let checkpoint = self.checkpoint();
        let op = match self.build_operation(method, tag, input.as_ref(), output.as_ref(), info) {
            Ok(op) => op,
            Err(e) => {
                self.restore(checkpoint);
                return Err(e);
            }
        };

        let path = rewrite_path(path);
        info!("Adding operation {} {} ({})", method, path, info.id);
        self.operation_ids.insert(info.id.clone());
        if !tag.is_empty() && !self.api.tags.contains_key(tag) {
            self.add_tag(tag, "");
        }
        let item = self.api.paths.entry(path).or_default();
        set_operation_by_method(item, op, method);
        Ok(())
    }

    fn build_operation(
        &mut self,
        method: HttpMethod,
        tag: &str,
        input: Option<&syn::Type>,
        output: Option<&syn::Type>,
        info: &OperationInfo,
    ) -> Result<Operation> {
        let mut op = Operation {
            operation_id: info.id.clone(),
            summary: info.summary.clone(),
            description: info.description.clone(),
            deprecated: info.deprecated,
            ..Operation::default()
        };
        if !tag.is_empty() {
            op.tags.push(tag.to_string());
        }

        if let Some(input) = input {
            self.set_operation_params(&mut op, input, method.allows_body())?;
        }

        self.set_operation_response(
            &mut op,
            output,
            &info.status_code.to_string(),
            JSON_MEDIA_TYPE,
            &info.status_description,
            &info.headers,
        )?;

        for response in &info.responses {
            let model = response.model.as_deref().map(parse_type).transpose()?;
            self.set_operation_response(
                &mut op,
                model.as_ref(),
                &response.code,
                JSON_MEDIA_TYPE,
                &response.description,
                &[],
            )?;
        }

        Ok(op)
    }

    /// Turns the fields of `input` into parameters and, if `allow_body`, a request body.
    ///
    /// Fields with a path, query or header annotation become parameters named after
    /// the annotation value; path parameters are always required. The remaining
    /// fields form an inline object schema sent as a JSON body. When two fields end
    /// up with the same parameter or property name, the first one wins.
    ///
    /// # Errors
    ///
    /// Fails if `input` is not a struct or if a field declares more than one location.
    pub fn set_operation_params(&mut self, op: &mut Operation, input: &syn::Type, allow_body: bool) -> Result<()> {
        let def = self.struct_def(input)?;

        let collected = self.collect_fields(&def);

        let located = collected
            .fields
            .into_iter()
            .map(|cf| {
                let location = param_location(&cf.field, &cf.owner.key.to_string(), &self.config)?;
                Ok::<_, GeneratorError>((cf, location))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut body = Vec::new();
        let mut body_names = HashSet::new();
        for (cf, location) in located {
            let Some((location, _)) = location else {
                if !allow_body {
                    continue;
                }
                let name = self.field_name(&cf);
                if !name.is_empty() && body_names.insert(name.clone()) {
                    body.push((name, cf));
                }
                continue;
            };

            let name = field_name_from_tag(&cf.field, self.location_tag(location), None);
            if name.is_empty() {
                continue;
            }
            if op.parameters.iter().any(|p| p.name == name && p.location == location) {
                debug!("Dropping duplicate {:?} parameter `{}`", location, name);
                continue;
            }

            let annotations = extract_annotations(&cf.field.attrs, &self.config);
            let required = annotations.required || location == ParameterLocation::Path;
            let schema = self.new_schema_from_struct_field(&cf.field, required, &name, &cf.owner);
            op.parameters.push(Parameter {
                name,
                location,
                description: annotations.description,
                required,
                deprecated: annotations.deprecated,
                schema,
            });
        }

        if !body.is_empty() || (allow_body && collected.additional.is_some()) {
            let additional = if allow_body { collected.additional } else { None };
            let schema = self.object_schema(body, additional);
            op.request_body = Some(RequestBody {
                description: None,
                required: true,
                content: BTreeMap::from([(
                    JSON_MEDIA_TYPE.to_string(),
                    MediaType {
                        schema: SchemaOrRef::inline(schema),
                    },
                )]),
            });
        }

        Ok(())
    }

    /// Adds the response for `code` to `op`.
    ///
    /// `ty` is the response body, `None` for an empty one. Headers without a model are
    /// plain strings.
    ///
    /// # Errors
    ///
    /// Fails if `code` is not a positive integer, if `op` already has a response for
    /// it, or if a header model does not parse.
    pub fn set_operation_response(
        &mut self,
        op: &mut Operation,
        ty: Option<&syn::Type>,
        code: &str,
        media_type: &str,
        description: &str,
        headers: &[ResponseHeader],
    ) -> Result<()> {
        let code = code.trim();
        if !code.parse::<u16>().is_ok_and(|c| c > 0) {
            return Err(GeneratorError::InvalidStatusCode(code.to_string()));
        }
        if op.responses.contains_key(code) {
            return Err(GeneratorError::DuplicateResponseCode {
                operation: op.operation_id.clone(),
                code: code.to_string(),
            });
        }
        let header_models = headers
            .iter()
            .map(|h| h.model.as_deref().map(parse_type).transpose())
            .collect::<Result<Vec<_>>>()?;

        let mut response = Response {
            description: description.to_string(),
            ..Response::default()
        };

        if let Some(schema) = ty.and_then(|ty| self.new_schema_from_type(Some(ty))) {
            let media_type = if media_type.is_empty() { JSON_MEDIA_TYPE } else { media_type };
            response
                .content
                .insert(media_type.to_string(), MediaType { schema });
        }

        for (header, model) in headers.iter().zip(header_models) {
            let schema = match model {
                Some(model) => self.new_schema_from_type(Some(&model)),
                None => Some(SchemaOrRef::inline(Schema::typed("string", None))),
            };
            let Some(schema) = schema else {
                continue;
            };
            response.headers.insert(
                header.name.clone(),
                Header {
                    description: Some(header.description.clone()).filter(|d| !d.is_empty()),
                    schema,
                },
            );
        }

        op.responses.insert(code.to_string(), response);
        Ok(())
    }

    fn location_tag(&self, location: ParameterLocation) -> &str {
        match location {
            ParameterLocation::Path => &self.config.path_location_tag,
            ParameterLocation::Query => &self.config.query_location_tag,
            ParameterLocation::Header => &self.config.header_location_tag,
        }
    }
}
