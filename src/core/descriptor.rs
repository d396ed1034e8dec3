use crate::core::{Collect, GcTrace, JSObjectDataPtr, Value};

bitflags::bitflags! {
    /// Attribute bits of an own property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyAttributes: u8 {
        const WRITABLE = 1 << 0;
        const ENUMERABLE = 1 << 1;
        const CONFIGURABLE = 1 << 2;
        /// Engine bookkeeping, hidden from enumeration.
        const INTERNAL = 1 << 3;
    }
}

impl PropertyAttributes {
    /// Attributes of a property created by plain assignment.
    pub const DEFAULT: PropertyAttributes = PropertyAttributes::WRITABLE
        .union(PropertyAttributes::ENUMERABLE)
        .union(PropertyAttributes::CONFIGURABLE);

    /// Attributes of built-in methods: writable and configurable, not enumerable.
    pub const HIDDEN: PropertyAttributes = PropertyAttributes::WRITABLE.union(PropertyAttributes::CONFIGURABLE);
}

#[derive(Clone)]
pub enum PropertySlot<'gc> {
    Value(Value<'gc>),
    Accessor {
        get: Option<JSObjectDataPtr<'gc>>,
        set: Option<JSObjectDataPtr<'gc>>,
    },
}

unsafe impl<'gc> Collect<'gc> for PropertySlot<'gc> {
    fn trace<T: GcTrace<'gc>>(&self, cc: &mut T) {
        match self {
            PropertySlot::Value(v) => v.trace(cc),
            PropertySlot::Accessor { get, set } => {
                if let Some(g) = get {
                    g.trace(cc);
                }
                if let Some(s) = set {
                    s.trace(cc);
                }
            }
        }
    }
}

/// An own property: a data value or an accessor pair, plus its attributes.
#[derive(Clone)]
pub struct PropertyDescriptor<'gc> {
    pub slot: PropertySlot<'gc>,
    pub attributes: PropertyAttributes,
}

unsafe impl<'gc> Collect<'gc> for PropertyDescriptor<'gc> {
    fn trace<T: GcTrace<'gc>>(&self, cc: &mut T) {
        self.slot.trace(cc);
    }
}

impl<'gc> PropertyDescriptor<'gc> {
    pub fn new_data(value: Value<'gc>, attributes: PropertyAttributes) -> Self {
        PropertyDescriptor {
            slot: PropertySlot::Value(value),
            attributes,
        }
    }

    /// Accessor properties carry no WRITABLE bit.
    pub fn new_accessor(get: Option<JSObjectDataPtr<'gc>>, set: Option<JSObjectDataPtr<'gc>>, attributes: PropertyAttributes) -> Self {
        PropertyDescriptor {
            slot: PropertySlot::Accessor { get, set },
            attributes: attributes.difference(PropertyAttributes::WRITABLE),
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self.slot, PropertySlot::Accessor { .. })
    }

    pub fn writable(&self) -> bool {
        self.attributes.contains(PropertyAttributes::WRITABLE)
    }

    pub fn enumerable(&self) -> bool {
        self.attributes.contains(PropertyAttributes::ENUMERABLE) && !self.attributes.contains(PropertyAttributes::INTERNAL)
    }

    pub fn configurable(&self) -> bool {
        self.attributes.contains(PropertyAttributes::CONFIGURABLE)
    }

    /// The stored value of a data property.
    pub fn value(&self) -> Option<&Value<'gc>> {
        match &self.slot {
            PropertySlot::Value(v) => Some(v),
            PropertySlot::Accessor { .. } => None,
        }
    }

    pub fn getter(&self) -> Option<JSObjectDataPtr<'gc>> {
        match &self.slot {
            PropertySlot::Accessor { get, .. } => *get,
            PropertySlot::Value(_) => None,
        }
    }

    pub fn setter(&self) -> Option<JSObjectDataPtr<'gc>> {
        match &self.slot {
            PropertySlot::Accessor { set, .. } => *set,
            PropertySlot::Value(_) => None,
        }
    }
}

impl std::fmt::Debug for PropertyDescriptor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.slot {
            PropertySlot::Value(v) => write!(f, "Data({v:?}, {:?})", self.attributes),
            PropertySlot::Accessor { get, set } => {
                write!(f, "Accessor(get: {}, set: {}, {:?})", get.is_some(), set.is_some(), self.attributes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_attributes() {
        let desc = PropertyDescriptor::new_data(Value::Number(1.0), PropertyAttributes::DEFAULT);
        assert!(desc.writable() && desc.enumerable() && desc.configurable());
        assert!(!desc.is_accessor());
    }

    #[test]
    fn test_internal_is_never_enumerable() {
        let desc = PropertyDescriptor::new_data(Value::Undefined, PropertyAttributes::ENUMERABLE | PropertyAttributes::INTERNAL);
        assert!(!desc.enumerable());
    }

    #[test]
    fn test_accessor_drops_writable() {
        let desc: PropertyDescriptor<'_> = PropertyDescriptor::new_accessor(None, None, PropertyAttributes::DEFAULT);
        assert!(desc.is_accessor());
        assert!(!desc.writable());
        assert!(desc.configurable());
    }
}
