/// Builder setters for request structs.
///
/// `setter!(name: Ty)` assigns a plain field, `setter!(opt name: Ty)` wraps
/// the value in `Some`, and `setter!(opt body.name: Ty)` reaches into a nested
/// payload struct (usually one flattened into the JSON body).
macro_rules! setter {
    ($field:ident : $ty:ty) => {
        #[must_use]
        pub fn $field<T>(mut self, value: T) -> Self
        where
            T: Into<$ty>,
        {
            self.$field = value.into();
            self
        }
    };

    (opt $field:ident : $ty:ty) => {
        #[must_use]
        pub fn $field<T>(mut self, value: T) -> Self
        where
            T: Into<$ty>,
        {
            self.$field = ::std::option::Option::Some(value.into());
            self
        }
    };

    (opt $body:ident . $field:ident : $ty:ty) => {
        #[must_use]
        pub fn $field<T>(mut self, value: T) -> Self
        where
            T: Into<$ty>,
        {
            self.$body.$field = ::std::option::Option::Some(value.into());
            self
        }
    };
}

pub(crate) use setter;
