//! Multi-part field collections and form-like structures.
//!
//! [`FormData`] is an ordered list of named text or blob entries. [`Form`]
//! models a set of form controls and flattens to a [`FormData`] following
//! form-submission rules, so both encode the same way on the wire.

/// Binary field content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl Blob {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            ..Self::default()
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    Blob(Blob),
}

impl From<&str> for FormValue {
    fn from(text: &str) -> Self {
        FormValue::Text(text.to_string())
    }
}

impl From<String> for FormValue {
    fn from(text: String) -> Self {
        FormValue::Text(text)
    }
}

impl From<Blob> for FormValue {
    fn from(blob: Blob) -> Self {
        FormValue::Blob(blob)
    }
}

/// Ordered multi-part field collection. Names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<FormValue>) -> &mut Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, value)| value)
    }

    pub fn entries(&self) -> &[(String, FormValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N, V> FromIterator<(N, V)> for FormData
where
    N: Into<String>,
    V: Into<FormValue>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
    Text,
    Password,
    Hidden,
    Textarea,
    Checkbox { checked: bool },
    Radio { checked: bool },
    Select { selected: Vec<String> },
    File { files: Vec<Blob> },
    Button,
}

/// A named input inside a [`Form`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormControl {
    pub name: String,
    pub value: String,
    pub kind: ControlKind,
    pub disabled: bool,
}

impl FormControl {
    pub fn new(kind: ControlKind, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind,
            disabled: false,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ControlKind::Text, name, value)
    }

    pub fn password(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ControlKind::Password, name, value)
    }

    pub fn hidden(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ControlKind::Hidden, name, value)
    }

    pub fn textarea(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ControlKind::Textarea, name, value)
    }

    pub fn checkbox(name: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        Self::new(ControlKind::Checkbox { checked }, name, value)
    }

    pub fn radio(name: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        Self::new(ControlKind::Radio { checked }, name, value)
    }

    pub fn select<I, S>(name: impl Into<String>, selected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let selected = selected.into_iter().map(Into::into).collect();
        Self::new(ControlKind::Select { selected }, name, "")
    }

    pub fn file(name: impl Into<String>, files: Vec<Blob>) -> Self {
        Self::new(ControlKind::File { files }, name, "")
    }

    pub fn button(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ControlKind::Button, name, value)
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    fn submit_into(&self, data: &mut FormData) {
        if self.name.is_empty() || self.disabled {
            return;
        }
        match &self.kind {
            ControlKind::Text
            | ControlKind::Password
            | ControlKind::Hidden
            | ControlKind::Textarea => {
                data.append(self.name.as_str(), self.value.as_str());
            }
            ControlKind::Checkbox { checked } | ControlKind::Radio { checked } => {
                if *checked {
                    let value = if self.value.is_empty() { "on" } else { self.value.as_str() };
                    data.append(self.name.as_str(), value);
                }
            }
            ControlKind::Select { selected } => {
                for option in selected {
                    data.append(self.name.as_str(), option.as_str());
                }
            }
            ControlKind::File { files } if files.is_empty() => {
                data.append(self.name.as_str(), Blob::default().with_filename(""));
            }
            ControlKind::File { files } => {
                for file in files {
                    data.append(self.name.as_str(), file.clone());
                }
            }
            ControlKind::Button => {}
        }
    }
}

/// A form-like structure: controls in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    controls: Vec<FormControl>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn control(mut self, control: FormControl) -> Self {
        self.controls.push(control);
        self
    }

    pub fn controls(&self) -> &[FormControl] {
        &self.controls
    }

    /// The entries this form submits, in declaration order.
    pub fn to_form_data(&self) -> FormData {
        let mut data = FormData::new();
        for control in &self.controls {
            control.submit_into(&mut data);
        }
        data
    }
}

impl FromIterator<FormControl> for Form {
    fn from_iter<I: IntoIterator<Item = FormControl>>(iter: I) -> Self {
        Self {
            controls: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(data: &FormData) -> Vec<(&str, &str)> {
        data.entries()
            .iter()
            .map(|(name, value)| match value {
                FormValue::Text(text) => (name.as_str(), text.as_str()),
                FormValue::Blob(_) => (name.as_str(), "<blob>"),
            })
            .collect()
    }

    #[test]
    fn form_data_keeps_insertion_order_and_duplicates() {
        let mut data = FormData::new();
        data.append("b", "1").append("a", "2").append("b", "3");

        assert_eq!(texts(&data), vec![("b", "1"), ("a", "2"), ("b", "3")]);
        assert_eq!(data.get("b"), Some(&FormValue::Text("1".to_string())));
        assert_eq!(data.get("missing"), None);
    }

    #[test]
    fn form_data_collects_from_pairs() {
        let data: FormData = [("name", "foo"), ("password", "123456")].into_iter().collect();
        assert_eq!(data.len(), 2);
        assert_eq!(texts(&data), vec![("name", "foo"), ("password", "123456")]);
    }

    #[test]
    fn text_inputs_submit_in_declaration_order() {
        let form = Form::new()
            .control(FormControl::text("name", "foo"))
            .control(FormControl::password("password", "123456"));

        assert_eq!(texts(&form.to_form_data()), vec![("name", "foo"), ("password", "123456")]);
    }

    #[test]
    fn unnamed_disabled_and_button_controls_are_skipped() {
        let form = Form::new()
            .control(FormControl::text("", "anonymous"))
            .control(FormControl::text("locked", "x").disabled())
            .control(FormControl::button("go", "Go"))
            .control(FormControl::hidden("token", "abc"));

        assert_eq!(texts(&form.to_form_data()), vec![("token", "abc")]);
    }

    #[test]
    fn only_checked_boxes_submit() {
        let form: Form = [
            FormControl::checkbox("tos", "", true),
            FormControl::checkbox("news", "yes", false),
            FormControl::radio("color", "red", false),
            FormControl::radio("color", "blue", true),
        ]
        .into_iter()
        .collect();

        assert_eq!(texts(&form.to_form_data()), vec![("tos", "on"), ("color", "blue")]);
    }

    #[test]
    fn select_submits_each_selected_option() {
        let form = Form::new().control(FormControl::select("tags", ["a", "c"]));
        assert_eq!(texts(&form.to_form_data()), vec![("tags", "a"), ("tags", "c")]);
    }

    #[test]
    fn file_input_without_files_submits_empty_blob() {
        let form = Form::new().control(FormControl::file("upload", Vec::new()));
        let data = form.to_form_data();

        let Some(FormValue::Blob(blob)) = data.get("upload") else {
            panic!("expected a blob entry");
        };
        assert!(blob.bytes.is_empty());
        assert_eq!(blob.filename.as_deref(), Some(""));
    }

    #[test]
    fn file_input_submits_each_file() {
        let files = vec![
            Blob::new(b"one".to_vec()).with_filename("1.txt"),
            Blob::new(b"two".to_vec()).with_filename("2.txt"),
        ];
        let form = Form::new().control(FormControl::file("upload", files));

        assert_eq!(form.to_form_data().len(), 2);
    }
}
