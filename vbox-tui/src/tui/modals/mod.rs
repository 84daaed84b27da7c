pub mod property_edit;
