use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields};

/// Derive macro projecting a plain struct into per-field reactive signals.
///
/// For a struct `State` with named fields this generates `StateSignals`
/// (read-write `Signal` per field) and `StateWriters` (write-only
/// `WriteSignal` per field), a `writers()` projection, an untracked
/// `snapshot()` back to `State`, and the `StoreState` implementation used by
/// `create_store`/`create_mutable`. Field types must be
/// `Clone + PartialEq + 'static`.
///
/// # Example
/// ```ignore
/// #[derive(Clone, PartialEq, StoreFields)]
/// struct Player {
///     health: u32,
///     score: u32,
/// }
///
/// let (player, set_player) = create_store(Player { health: 100, score: 0 }, Default::default());
/// set_player.score.update(|s| *s += 10);
/// assert_eq!(player.score.get(), 10);
/// ```
#[proc_macro_derive(StoreFields)]
pub fn store_fields(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;
    let vis = &input.vis;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("StoreFields can only be derived for structs with named fields"),
        },
        _ => panic!("StoreFields can only be derived for structs"),
    };

    let field_names: Vec<_> = fields
        .iter()
        .map(|field| field.ident.as_ref().unwrap())
        .collect();
    let field_types: Vec<_> = fields.iter().map(|field| &field.ty).collect();
    let field_vis: Vec<_> = fields.iter().map(|field| &field.vis).collect();

    let signals_name = format_ident!("{}Signals", name);
    let writers_name = format_ident!("{}Writers", name);

    let expanded = quote! {
        #[derive(Clone)]
        #vis struct #signals_name {
            #(#field_vis #field_names: ::solder::reactive::Signal<#field_types>,)*
        }

        #[derive(Clone)]
        #vis struct #writers_name {
            #(#field_vis #field_names: ::solder::reactive::WriteSignal<#field_types>,)*
        }

        impl #signals_name {
            /// Write-only projection over the same underlying field signals.
            #vis fn writers(&self) -> #writers_name {
                #writers_name {
                    #(#field_names: self.#field_names.clone().split().1,)*
                }
            }

            /// Untracked copy of the current field values.
            #vis fn snapshot(&self) -> #name {
                #name {
                    #(#field_names: self.#field_names.get_untracked(),)*
                }
            }
        }

        impl ::solder::reactive::StoreState for #name {
            type Signals = #signals_name;
            type Writers = #writers_name;

            fn split(self) -> (#signals_name, #writers_name) {
                let signals = #signals_name {
                    #(#field_names: ::solder::reactive::create_signal(self.#field_names),)*
                };
                let writers = signals.writers();
                (signals, writers)
            }
        }
    };

    TokenStream::from(expanded)
}
