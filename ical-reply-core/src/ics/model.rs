//! Owned property bag for calendar components.
//!
//! Calendar data is loosely typed: any property may appear zero or more times
//! and may carry arbitrary parameters. These types keep everything in file
//! order so that copying a property into a reply reproduces it verbatim.

/// A property parameter such as `CN=Alice` or `PARTSTAT=ACCEPTED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

/// A single content line: name, parameters and value.
///
/// Values and parameter values are stored decoded: TEXT escapes and
/// parameter quoting are undone by the parser and redone on output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
    pub params: Vec<Parameter>,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Property {
            name: name.into().to_ascii_uppercase(),
            value: value.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_param(name, value);
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// First value of the named parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.as_str())
    }

    /// Replace the named parameter, or append it if absent.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_uppercase();
        let value = value.into();
        match self.params.iter().position(|p| p.name.eq_ignore_ascii_case(&name)) {
            Some(index) => {
                self.params[index].value = value;
                let mut seen = 0;
                self.params.retain(|p| {
                    if !p.name.eq_ignore_ascii_case(&name) {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.params.push(Parameter { name, value }),
        }
    }

    /// Remove every occurrence of the named parameter. Returns whether any existed.
    pub fn remove_param(&mut self, name: &str) -> bool {
        let before = self.params.len();
        self.params.retain(|p| !p.name.eq_ignore_ascii_case(name));
        self.params.len() != before
    }
}

/// A calendar component (VCALENDAR, VEVENT, VTIMEZONE, STANDARD, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Component {
    pub name: String,
    pub properties: Vec<Property>,
    pub components: Vec<Component>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Component {
            name: name.into().to_ascii_uppercase(),
            ..Default::default()
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// First property with this name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.is(name))
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    pub fn properties_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> {
        self.properties.iter().filter(move |p| p.is(name))
    }

    pub fn properties_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Property> {
        self.properties.iter_mut().filter(move |p| p.is(name))
    }

    pub fn push(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Replace all properties of the same name with `property`.
    pub fn set(&mut self, property: Property) {
        self.remove(&property.name);
        self.properties.push(property);
    }

    pub fn remove(&mut self, name: &str) {
        self.properties.retain(|p| !p.is(name));
    }

    pub fn components_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Component> {
        self.components.iter().filter(move |c| c.is(name))
    }
}
